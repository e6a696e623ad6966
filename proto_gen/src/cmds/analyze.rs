/* Analyze command - resolve schema files and report the lowered model */

use super::common::{finish, load_config, load_schemas, resolve_all};
use clap::ValueEnum;
use proto_gen::{ResolvedSchema, StructDef};
use std::path::PathBuf;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /* Human-readable report */
    Text,
    /* Serialized resolved schemas */
    Json,
}

pub struct AnalyzeOptions {
    pub files: Vec<PathBuf>,
    pub include_dirs: Vec<PathBuf>,
    pub format: OutputFormat,
    pub config: Option<PathBuf>,
    pub no_consolidate: bool,
    pub print_edges: bool,
}

/* Execute the analyze command */
pub fn run(options: AnalyzeOptions) -> anyhow::Result<()> {
    let config = load_config(options.config.as_deref(), options.no_consolidate)?;
    let (resolver, targets) = load_schemas(&options.files, options.include_dirs)?;
    let outcome = resolve_all(&resolver, &targets, &config)?;

    match options.format {
        OutputFormat::Json => {
            let resolved: Vec<&ResolvedSchema> = outcome.succeeded().collect();
            println!("{}", serde_json::to_string_pretty(&resolved)?);
        }
        OutputFormat::Text => {
            println!("Schema Layout Resolver - Analysis");
            println!("=================================\n");
            println!(
                "[~] Loaded {} file(s) total (including imports)",
                resolver.loaded_file_count()
            );
            println!("[~] Packages loaded:");
            for package in resolver.get_packages() {
                println!("    - {}", if package.is_empty() { "<none>" } else { package.as_str() });
            }
            println!();

            for schema in outcome.succeeded() {
                print_schema(schema, options.print_edges);
            }
        }
    }

    finish(&outcome)
}

fn print_struct(schema: &ResolvedSchema, def: &StructDef) {
    let parent = def
        .parent
        .map(|id| format!(" : {}", schema.arena[id].ty))
        .unwrap_or_default();
    let marker = if def.synthesized { " (consolidated)" } else { "" };
    println!("  struct {}{}{}", def.ty, parent, marker);

    for field in &def.fields {
        println!("    {} {}", field.ty, field.name);
        for alternative in &field.alternatives {
            println!("      | {} {}", alternative.ty, alternative.name);
        }
    }
}

fn print_schema(schema: &ResolvedSchema, print_edges: bool) {
    println!("[✓] {} ({})", schema.source.display(), schema.class_name);
    println!("    package: {}", schema.package);
    for import in &schema.imports {
        println!("    import:  {}", import.display());
    }
    println!();

    if !schema.enums.is_empty() {
        println!("Enums:");
        for def in &schema.enums {
            println!("  enum {}", def.ty);
            for (name, tag) in &def.constants {
                println!("    {} = {}", name, tag);
            }
        }
        println!();
    }

    println!("Structs (declaration order):");
    for def in schema.ordered_structs() {
        print_struct(schema, def);
    }
    println!();

    if !schema.consolidated.is_empty() {
        println!("Consolidated parents:");
        for id in &schema.consolidated {
            let def = &schema.arena[*id];
            let display = def.display_name().unwrap_or_default();
            println!("  {} \"{}\" ({} field(s))", def.ty, display, def.fields.len());
        }
        println!();
    }

    if !schema.casts.is_empty() {
        println!("Casts:");
        for pair in &schema.casts {
            println!("  {} <-> {}", pair.wire.ty, schema.arena[pair.host].ty);
        }
        println!();
    }

    if !schema.services.is_empty() {
        println!("Services:");
        for service in &schema.services {
            println!("  service {}", service.name);
            for rpc in &service.rpcs {
                println!(
                    "    rpc {}({} | {}) -> {} | {}",
                    rpc.name, rpc.request.host, rpc.request.wire, rpc.response.host, rpc.response.wire
                );
            }
        }
        println!();
    }

    if schema.uses_variant_fields() {
        println!("[~] Uses variant fields");
    }

    if print_edges {
        let graph = schema.dependency_graph();
        println!("Dependency edges ({} node(s)):", graph.node_count());
        for (from, to) in graph.edge_types() {
            println!("  {} -> {}", from, to);
        }
        println!();
    }
}
