pub use clap::Parser;

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "artifactorial")]
#[command(about = "Serve stored artifacts behind per-directory ownership")]
pub struct Args {
    /// Path to the config file (defaults to ~/.artifactorial/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the configured log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: crate::Command,
}
