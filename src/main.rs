//! discord-notifier - send one alert group to a configured Discord channel.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use discord_notifier::cli::{Cli, LogFormat};
use discord_notifier::config::Config;
use discord_notifier::metrics::record_build_info;
use discord_notifier::{
    AlertGroup, ChannelRegistry, HttpTransport, NotificationChannel, StdoutTransport,
    WebhookTransport, register_metric_descriptions,
};

/// Initialize the tracing subscriber with the specified log format.
///
/// Logs go to stderr so stdout stays free for `--validate` and `--dry-run`
/// output.
fn init_logging(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    match format {
        LogFormat::Text => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_env_filter(filter)
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .json()
                .with_current_span(true)
                .with_span_list(false)
                .flatten_event(true)
                .with_env_filter(filter)
                .init();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.log_format);
    register_metric_descriptions();
    record_build_info();

    info!(config_path = %cli.config.display(), "Loading configuration");

    let config = match Config::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, path = %cli.config.display(), "Failed to load configuration");
            std::process::exit(1);
        }
    };

    // fail fast on any configuration error
    if let Err(errors) = config.validate() {
        for e in &errors {
            error!(error = %e, "Configuration validation error");
        }
        error!(
            error_count = errors.len(),
            "Configuration validation failed"
        );
        std::process::exit(1);
    }

    if cli.validate {
        println!("Configuration is valid: {}", cli.config.display());
        println!("  Channels: {}", config.channels.len());
        for (name, channel) in &config.channels {
            println!(
                "    - {} ({}{})",
                name,
                channel.channel_type,
                if channel.disable_resolve_message {
                    ", resolve messages disabled"
                } else {
                    ""
                }
            );
        }
        println!(
            "  Templates: {}",
            config.templates.len() + config.template_files.len()
        );
        println!("  HTTP timeout: {:?}", config.http.timeout);
        return Ok(());
    }

    let alerts_path = cli
        .alerts
        .as_deref()
        .ok_or_else(|| anyhow!("--alerts is required"))?;
    let group = read_group(alerts_path)?;

    let templates = Arc::new(config.template_set()?);
    let transport: Arc<dyn WebhookTransport> = if cli.dry_run {
        Arc::new(StdoutTransport)
    } else {
        Arc::new(HttpTransport::with_timeout(config.http.timeout)?)
    };

    let registry = match ChannelRegistry::from_config(&config, templates, transport) {
        Ok(r) => r,
        Err(errors) => {
            for e in &errors {
                error!(error = %e, "Failed to create channel");
            }
            std::process::exit(1);
        }
    };

    let channel = select_channel(&registry, cli.channel.as_deref())?;

    if group.is_resolved_only() && !channel.should_notify_on_resolve() {
        info!(
            channel_name = %channel.name(),
            "Resolve messages disabled for channel, skipping resolved group"
        );
        return Ok(());
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run(channel, group))
}

/// Delivers `group` once, abandoning delivery on ctrl-c.
async fn run(channel: Arc<dyn NotificationChannel>, group: AlertGroup) -> Result<()> {
    let cancel = CancellationToken::new();

    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for ctrl-c signal");
            return;
        }
        info!("Received shutdown signal, cancelling delivery");
        cancel_clone.cancel();
    });

    channel
        .notify(&group, &cancel)
        .await
        .with_context(|| format!("channel '{}'", channel.name()))
}

fn read_group(path: &Path) -> Result<AlertGroup> {
    let content = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read alert group from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read alert group {}", path.display()))?
    };

    serde_json::from_str(&content)
        .with_context(|| format!("invalid alert group {}", path.display()))
}

fn select_channel(
    registry: &ChannelRegistry,
    name: Option<&str>,
) -> Result<Arc<dyn NotificationChannel>> {
    match name {
        Some(name) => registry.get(name).ok_or_else(|| {
            anyhow!(
                "unknown channel '{}' (configured: {})",
                name,
                registry.names().join(", ")
            )
        }),
        None => {
            let names = registry.names();
            match names.as_slice() {
                [only] => registry
                    .get(only)
                    .ok_or_else(|| anyhow!("channel '{}' disappeared", only)),
                _ => bail!(
                    "--channel is required when several channels are configured ({})",
                    names.join(", ")
                ),
            }
        }
    }
}
