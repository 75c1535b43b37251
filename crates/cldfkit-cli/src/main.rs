//! cldfkit CLI - build and read CLDF datasets.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Build {
            request,
            dir,
            module,
            no_validate,
            register_undefined,
            json,
        } => commands::build::run(
            commands::build::BuildArgs {
                request,
                dir,
                module,
                no_validate,
                register_undefined,
                json,
            },
            cli.components.as_deref(),
            cli.verbose,
        ),

        Commands::Load {
            metadata,
            table,
            json,
        } => commands::load::run(metadata, table, json, cli.verbose),

        Commands::Components { handle, json } => {
            commands::components::run(handle, json, cli.components.as_deref())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Log to stderr. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "cldfkit=debug" } else { "cldfkit=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
