use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "packsmith")]
#[command(author, version, about = "Media pack preprocessing tool")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Process a source directory into archive (.7z) and dist (.zip) packs
    Process {
        /// Source directory of mixed media
        #[arg(required = true)]
        source: PathBuf,

        /// Number of concurrent conversions (overrides config)
        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// Rebuild the dist archive from an already-staged dist tree
    Reprocess {
        /// Staged dist tree (the `<pack>_dist` directory)
        #[arg(required = true)]
        tree: PathBuf,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
