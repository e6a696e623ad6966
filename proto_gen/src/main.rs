use clap::{Parser, Subcommand};
use cmds::analyze::{AnalyzeOptions, OutputFormat};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod cmds;

#[derive(Parser)]
#[command(name = "protolayout")]
#[command(about = "Schema lowering and struct layout resolver", long_about = None)]
struct Cli {
    /* Enable debug logging (overridden by RUST_LOG) */
    #[arg(short = 'v', long = "verbose", global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /* Resolve schema files and show the lowered, ordered type model */
    Analyze {
        /* Input YAML schema files */
        #[arg(short = 'f', long = "files", value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /* Include directories for imported schema files */
        #[arg(short = 'i', long = "include-dir", value_name = "DIR")]
        include_dirs: Vec<PathBuf>,

        /* Output format */
        #[arg(long = "format", value_enum, default_value = "text")]
        format: OutputFormat,

        /* Generator configuration file (YAML) */
        #[arg(long = "config", value_name = "FILE")]
        config: Option<PathBuf>,

        /* Skip the consolidation pass */
        #[arg(long = "no-consolidate")]
        no_consolidate: bool,

        /* Print the dependency edges of the final struct order */
        #[arg(long = "print-edges")]
        print_edges: bool,
    },

    /* Print the final declaration order of each schema file */
    Order {
        /* Input YAML schema files */
        #[arg(short = 'f', long = "files", value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /* Include directories for imported schema files */
        #[arg(short = 'i', long = "include-dir", value_name = "DIR")]
        include_dirs: Vec<PathBuf>,

        /* Generator configuration file (YAML) */
        #[arg(long = "config", value_name = "FILE")]
        config: Option<PathBuf>,

        /* Skip the consolidation pass */
        #[arg(long = "no-consolidate")]
        no_consolidate: bool,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Analyze {
            files,
            include_dirs,
            format,
            config,
            no_consolidate,
            print_edges,
        } => {
            cmds::analyze::run(AnalyzeOptions {
                files,
                include_dirs,
                format,
                config,
                no_consolidate,
                print_edges,
            })?;
        }

        Commands::Order {
            files,
            include_dirs,
            config,
            no_consolidate,
        } => {
            cmds::order::run(files, include_dirs, config, no_consolidate)?;
        }
    }

    Ok(())
}
