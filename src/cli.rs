use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// VenueScout: venue discovery agent for touring musicians.
///
/// Finds music venues in a target city matched to an artist profile, and
/// produces booking research reports, by prompting the Anthropic API with
/// web search enabled. Requires `ANTHROPIC_API_KEY` in the environment.
#[derive(Debug, Parser)]
#[command(name = "venuescout", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the web application.
    Serve(ServeArgs),

    /// One-shot venue discovery from the terminal; prints JSON to stdout.
    Discover(DiscoverArgs),
}

/// Options shared by every subcommand. Each can also be set via config
/// file or env vars (`VENUESCOUT_*`). Precedence: CLI > env > file.
#[derive(Debug, Clone, clap::Args)]
pub struct ConfigArgs {
    /// Path to a TOML configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Model override (default: the current Sonnet release).
    #[arg(long)]
    pub model: Option<String>,

    /// Per-request timeout in seconds (default: 180 = 3 minutes).
    #[arg(long)]
    pub request_timeout_secs: Option<u64>,

    /// Retries for transient API failures (default: 2).
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Log level filter (default: "info"). Supports tracing directives
    /// (e.g. "debug", "venuescout=trace,warn"). Overridden by the
    /// VENUESCOUT_LOG env var.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to a log file. When set, structured JSON logs are appended
    /// here in addition to the human-readable stderr output.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Alternative Anthropic endpoint (gateway or proxy).
    #[arg(long)]
    pub anthropic_base_url: Option<String>,
}

/// Arguments for the `serve` subcommand.
#[derive(Debug, Clone, clap::Args)]
pub struct ServeArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Address to listen on (default: "0.0.0.0:8080").
    #[arg(long)]
    pub bind_addr: Option<SocketAddr>,
}

/// Arguments for the `discover` subcommand.
#[derive(Debug, Clone, clap::Args)]
pub struct DiscoverArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Target city (e.g. "Nashville, TN").
    #[arg(long)]
    pub city: String,

    /// Artist or band name.
    #[arg(long)]
    pub name: String,

    /// Genre (e.g. "Folk").
    #[arg(long)]
    pub genre: String,

    /// Typical draw size (e.g. "200-400").
    #[arg(long)]
    pub draw_size: String,

    /// Fee range (e.g. "$1,500-3,000").
    #[arg(long)]
    pub fee_range: Option<String>,

    /// Home base city.
    #[arg(long)]
    pub home_base: Option<String>,

    /// Comma-separated similar artists.
    #[arg(long)]
    pub similar_artists: Option<String>,
}
