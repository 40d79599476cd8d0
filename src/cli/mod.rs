//! CLI surface (SPEC_FULL.md §6.4), grounded on the teacher's clap derive style.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "codeindexer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose (debug-level) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the configuration file (overrides CODEINDEXER_CONFIG)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the project if absent and run a full index.
    Index {
        /// Path to the repository to index
        path: String,

        /// Project name (defaults to the directory's basename)
        #[arg(short, long)]
        project_name: Option<String>,

        /// Delete any existing project rows first
        #[arg(short, long)]
        force: bool,
    },

    /// Run the incremental reconciler against a previously indexed project.
    Reindex {
        /// Name of the project to reconcile
        project_name: String,
    },
}
