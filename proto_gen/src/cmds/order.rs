/* Order command - print only the final declaration order of each file */

use super::common::{finish, load_config, load_schemas, resolve_all};
use proto_gen::Declaration;
use std::path::PathBuf;

pub fn run(
    files: Vec<PathBuf>,
    include_dirs: Vec<PathBuf>,
    config: Option<PathBuf>,
    no_consolidate: bool,
) -> anyhow::Result<()> {
    let config = load_config(config.as_deref(), no_consolidate)?;
    let (resolver, targets) = load_schemas(&files, include_dirs)?;
    let outcome = resolve_all(&resolver, &targets, &config)?;

    for schema in outcome.succeeded() {
        println!("# {}", schema.source.display());
        for declaration in schema.declarations() {
            let kind = match declaration {
                Declaration::Enum(_) => "enum",
                Declaration::Struct(_) => "struct",
            };
            println!("{} {}", kind, declaration.name());
        }
    }

    finish(&outcome)
}
