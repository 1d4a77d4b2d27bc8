pub use clap::Parser;

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "treeseal")]
#[command(about = "Seal directory trees with signed manifests and verify them against a root certificate")]
#[command(version)]
pub struct Args {
    /// Path to the treeseal config directory (defaults to ~/.treeseal)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: crate::Command,
}
