pub use clap::Parser;

use std::path::PathBuf;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "sealdrop")]
#[command(about = "Send end-to-end encrypted messages through one-time links")]
#[command(version)]
pub struct Args {
    /// Daemon URL (defaults to the port in config.toml, then http://localhost:3000)
    #[arg(long, global = true)]
    pub remote: Option<Url>,

    /// Path to the sealdrop config directory (defaults to ~/.sealdrop)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: crate::Command,
}
