/* Common utilities shared between the analyze and order commands */

use anyhow::Context;
use proto_gen::{BatchOutcome, DualTypeRegistry, GeneratorConfig, resolve_batch};
use proto_loader::ImportResolver;
use std::path::{Path, PathBuf};

/* Load every target with its imports; returns the resolver and the target indices */
pub fn load_schemas(
  files: &[PathBuf],
  include_dirs: Vec<PathBuf>,
) -> anyhow::Result<(ImportResolver, Vec<usize>)> {
  let mut resolver = ImportResolver::new(include_dirs);
  let mut targets = Vec::with_capacity(files.len());

  for file in files {
    let index = resolver
      .load_file_with_imports(file)
      .with_context(|| format!("Failed to load schema '{}'", file.display()))?;
    if !targets.contains(&index) {
      targets.push(index);
    }
  }

  Ok((resolver, targets))
}

/* Load the configuration, applying command-line overrides */
pub fn load_config(path: Option<&Path>, no_consolidate: bool) -> anyhow::Result<GeneratorConfig> {
  let mut config = GeneratorConfig::load_or_default(path)?;
  if no_consolidate {
    config.consolidate = false;
  }
  Ok(config)
}

/* Resolve every target against a fresh registry */
pub fn resolve_all(
  resolver: &ImportResolver,
  targets: &[usize],
  config: &GeneratorConfig,
) -> anyhow::Result<BatchOutcome> {
  let registry = DualTypeRegistry::new(config);
  resolve_batch(&registry, resolver, targets, config).context("Type registration failed")
}

/* Print failures and turn a partial batch into an error */
pub fn finish(outcome: &BatchOutcome) -> anyhow::Result<()> {
  let mut failed = 0;
  for (path, err) in outcome.failed() {
    eprintln!("[✗] {}: {}", path.display(), err);
    failed += 1;
  }

  if failed > 0 {
    anyhow::bail!("{} of {} schema file(s) failed to resolve", failed, outcome.results.len());
  }
  Ok(())
}
