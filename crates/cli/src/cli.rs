//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Fact Relay - bounded producer/dispatcher relay for KPI facts
#[derive(Parser, Debug)]
#[command(
    name = "fact-relay",
    author,
    version,
    about = "Bounded, drop-on-full fact relay",
    long_about = "Relays KPI facts from a source to a sink through a bounded queue.\n\n\
                  Producers never block: a full queue drops the new fact. A single \n\
                  dispatcher delivers each fact once. SIGINT/SIGTERM stop intake and \n\
                  abandon (or briefly drain) whatever is still buffered."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "FACT_RELAY_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "FACT_RELAY_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the relay until shutdown
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "relay.toml", env = "FACT_RELAY_CONFIG")]
    pub config: PathBuf,

    /// Override queue capacity
    #[arg(long, env = "FACT_RELAY_CAPACITY")]
    pub capacity: Option<usize>,

    /// Override the HTTP sink endpoint
    #[arg(long, env = "FACT_RELAY_URL")]
    pub url: Option<String>,

    /// Bearer token for the HTTP sink (overrides sink.params.auth_token)
    #[arg(long, env = "FACT_RELAY_AUTH_TOKEN", hide_env_values = true)]
    pub auth_token: Option<String>,

    /// Override the number of synthetic facts
    #[arg(long, env = "FACT_RELAY_COUNT")]
    pub count: Option<u64>,

    /// Stop the relay after this many seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "FACT_RELAY_TIMEOUT")]
    pub timeout: u64,

    /// Keep draining for this long after shutdown (0 = abandon buffered facts)
    #[arg(long, env = "FACT_RELAY_DRAIN_GRACE_MS")]
    pub drain_grace_ms: Option<u64>,

    /// Trigger shutdown as soon as the source runs dry
    #[arg(long)]
    pub stop_when_exhausted: bool,

    /// Validate configuration and exit without running the relay
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "FACT_RELAY_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "relay.toml")]
    pub config: PathBuf,

    /// Bearer token the `run` command would use
    #[arg(long, env = "FACT_RELAY_AUTH_TOKEN", hide_env_values = true)]
    pub auth_token: Option<String>,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "relay.toml")]
    pub config: PathBuf,

    /// Bearer token the `run` command would use
    #[arg(long, env = "FACT_RELAY_AUTH_TOKEN", hide_env_values = true)]
    pub auth_token: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show the synthetic fact template
    #[arg(long)]
    pub template: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}
