//! CLI module for Mosaic
//!
//! Command-line interface definitions and handlers for the Mosaic
//! dashboard server.
//!
//! # Commands
//!
//! - `serve` - Start the dashboard server
//! - `tiles` - List configured tiles
//! - `config` - Configuration utilities (init)
//! - `completions` - Generate shell completions
//!
//! # Example
//!
//! ```bash
//! # Start server with default config
//! mosaic serve
//!
//! # List tiles from a specific config
//! mosaic tiles --config dashboards/ops.toml
//!
//! # Generate shell completions
//! mosaic completions bash > ~/.bash_completion.d/mosaic
//! ```

pub mod completions;
pub mod config;
pub mod output;
pub mod serve;
pub mod tiles;

pub use completions::handle_completions;
pub use config::handle_config_init;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Mosaic - Dashboard tile server
#[derive(Parser, Debug)]
#[command(
    name = "mosaic",
    version,
    about = "Dashboard backend with callback routing, tile caching, and sanitized rendering"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the Mosaic server
    Serve(ServeArgs),
    /// List configured tiles
    Tiles(TilesArgs),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "mosaic.toml")]
    pub config: PathBuf,

    /// Override server port
    #[arg(short, long, env = "MOSAIC_PORT")]
    pub port: Option<u16>,

    /// Override server host
    #[arg(short = 'H', long, env = "MOSAIC_HOST")]
    pub host: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "MOSAIC_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Disable the background tile refresh warmer
    #[arg(long)]
    pub no_refresh: bool,
}

#[derive(Args, Debug)]
pub struct TilesArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Filter by source name
    #[arg(short, long)]
    pub source: Option<String>,

    /// Path to configuration file
    #[arg(short, long, default_value = "mosaic.toml")]
    pub config: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Initialize a new configuration file
    Init(ConfigInitArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = "mosaic.toml")]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
