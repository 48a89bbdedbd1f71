use clap::Parser;
use std::path::PathBuf;

/// Forward a magnet link to a qBittorrent Web UI.
#[derive(Debug, Parser)]
#[command(name = "magnet2qb", version, about, long_about = None)]
pub struct Cli {
    /// Path to the config file. Defaults to the platform config directory.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log level or filter directive, overriding `logLevel` from the config
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Magnet link to add
    pub magnet: Option<String>,
}
