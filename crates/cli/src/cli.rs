//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Telemetry Router - severity-based event routing to log, alert and notification sinks
#[derive(Parser, Debug)]
#[command(
    name = "telemetry-router",
    author,
    version,
    about = "Severity-based telemetry event router",
    long_about = "Routes telemetry events to a batched persistent log, a sampled alert \n\
                  tracker and a preference-filtered notification channel.\n\n\
                  Events are read as JSON lines; thresholds come from a TOML or JSON \n\
                  configuration file."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "TELEMETRY_ROUTER_VERBOSE")]
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
        env = "TELEMETRY_ROUTER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    /// Prometheus metrics port (0 = disabled)
    #[arg(long, default_value = "0", global = true, env = "TELEMETRY_ROUTER_METRICS_PORT")]
    pub metrics_port: u16,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Route JSON-line events from a file or stdin
    Run(RunArgs),

    /// Route a single event and exit
    Emit(EmitArgs),

    /// Validate configuration file without routing anything
    Validate(ValidateArgs),

    /// Display routing table and sink bindings
    Info(InfoArgs),
}

/// Options shared by commands that build a dispatcher
#[derive(Parser, Debug, Clone)]
pub struct RouterArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "telemetry.toml",
        env = "TELEMETRY_ROUTER_CONFIG"
    )]
    pub config: PathBuf,

    /// Notification preferences file (TOML or JSON)
    #[arg(long, env = "TELEMETRY_ROUTER_PREFERENCES")]
    pub preferences: Option<PathBuf>,

    /// Override batch.batch_size from configuration
    #[arg(long, env = "TELEMETRY_ROUTER_BATCH_SIZE")]
    pub batch_size: Option<usize>,

    /// Override batch.flush_interval_ms from configuration
    #[arg(long, env = "TELEMETRY_ROUTER_FLUSH_INTERVAL_MS")]
    pub flush_interval_ms: Option<u64>,

    /// Override routing.alert_sample_rate from configuration
    #[arg(long, env = "TELEMETRY_ROUTER_SAMPLE_RATE")]
    pub sample_rate: Option<f64>,

    /// Echo every tracked event to the log
    #[arg(long)]
    pub echo: bool,
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub router: RouterArgs,

    /// JSON-lines input file; stdin when omitted
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Print the routing summary as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `emit` command
#[derive(Parser, Debug, Clone)]
pub struct EmitArgs {
    #[command(flatten)]
    pub router: RouterArgs,

    /// Event category, e.g. AUTH or UPLOAD
    #[arg(long)]
    pub category: String,

    /// Event action
    #[arg(long, default_value = "emit")]
    pub action: String,

    /// Severity tag (info, success, warning, error, critical)
    #[arg(long, default_value = "info")]
    pub severity: String,

    /// Context as a JSON value
    #[arg(long)]
    pub context: Option<String>,

    /// Event message
    pub message: String,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "telemetry.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "telemetry.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show sink bindings
    #[arg(long)]
    pub sinks: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}
