//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// cldfkit: reconcile ad hoc linguistic tables into CLDF datasets
#[derive(Parser)]
#[command(name = "cldfkit")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory of *-metadata.json component definitions (default: bundled)
    #[arg(long, global = true, value_name = "DIR")]
    pub components: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a dataset from a JSON build request
    Build {
        /// Path to the build request (JSON)
        #[arg(value_name = "REQUEST")]
        request: PathBuf,

        /// Output directory (overrides spec.dir)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// CLDF module (overrides spec.module)
        #[arg(short, long)]
        module: Option<String>,

        /// Skip validation of the written dataset
        #[arg(long)]
        no_validate: bool,

        /// Register columns a component does not define instead of warning
        #[arg(long)]
        register_undefined: bool,

        /// Output the build outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a dataset and print its contents
    Load {
        /// Path to the metadata file
        #[arg(value_name = "METADATA")]
        metadata: PathBuf,

        /// Only show this table (url, handle or component id)
        #[arg(short, long)]
        table: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List catalog components, or the columns of one
    Components {
        /// Table handle to show columns for
        #[arg(value_name = "HANDLE")]
        handle: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
