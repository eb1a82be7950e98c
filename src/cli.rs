//! Command-line interface for discord-notifier using clap.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_PATH;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format (default).
    #[default]
    Text,
    /// Structured JSON format for log aggregation.
    Json,
}

/// Send alert group notifications to Discord webhooks.
#[derive(Parser, Debug)]
#[command(name = "discord-notifier")]
#[command(version)]
#[command(about = "Send alert group notifications to Discord webhooks")]
pub struct Cli {
    /// Path to configuration file.
    #[arg(short = 'c', long = "config", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Path to a JSON alert group to notify about ("-" reads stdin).
    #[arg(long = "alerts", required_unless_present = "validate")]
    pub alerts: Option<PathBuf>,

    /// Channel to notify. May be omitted when exactly one is configured.
    #[arg(long = "channel")]
    pub channel: Option<String>,

    /// Validate configuration and exit.
    #[arg(long = "validate")]
    pub validate: bool,

    /// Print the webhook body instead of sending it.
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Log format: text or json.
    #[arg(long = "log-format", value_enum, default_value_t = LogFormat::Text, env = "LOG_FORMAT")]
    pub log_format: LogFormat,
}
