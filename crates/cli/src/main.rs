//! GitHub Org Manager entry point.
//!
//! This binary is the composition root for the whole workspace. It:
//!
//! 1. **Wires observability**: `tracing-subscriber` with pretty or JSON
//!    output, plus an OpenTelemetry OTLP exporter when one is configured.
//! 2. **Loads configuration**: the YAML file named by `--config`, validated
//!    once and shared by every component.
//! 3. **Constructs infrastructure**: the plugin registry from the built-in
//!    catalogue and the SNS alert publisher.
//! 4. **Invokes the handler**: reads the envelope from `--event` (or uses an
//!    empty one for a smoke test) and runs [`router::EventHandler::handle`].
//!    A failed invocation exits non-zero after the handler has alerted.

mod input;
mod observability;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use router::{EventHandler, InvocationContext, PluginRegistry};
use sns::SnsAlertPublisher;
use tracing::info;

use crate::observability::LogFormat;

/// Route one GitHub organisation webhook event to the matching plugins.
#[derive(Debug, Parser)]
#[command(name = "github-org-manager", version, about)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(long, env = "GITHUB_ORG_MANAGER_CONFIG", default_value = "config.yaml")]
    config: PathBuf,

    /// Path to a JSON event envelope. Omit to invoke with an empty envelope.
    #[arg(long)]
    event: Option<PathBuf>,

    /// Log stream name quoted in alerts.
    #[arg(long, env = "AWS_LAMBDA_LOG_STREAM_NAME")]
    log_stream: Option<String>,

    /// Log output format.
    #[arg(
        long,
        value_enum,
        env = "GITHUB_ORG_MANAGER_LOG_FORMAT",
        default_value_t = LogFormat::Pretty
    )]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let telemetry = observability::init(cli.log_format)?;

    let result = run(cli).await;

    telemetry.shutdown();
    result
}

async fn run(cli: Cli) -> Result<()> {
    let config = input::load_config(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    let registry = PluginRegistry::load(plugins::catalogue(), &config);
    let envelope = input::read_envelope(cli.event.as_deref())?;

    let publisher = SnsAlertPublisher::new();
    let context = InvocationContext::new(cli.log_stream);
    info!(
        invocation_id = %context.invocation_id,
        plugins = registry.len(),
        "Handling event"
    );

    EventHandler::new(&config, &registry, &publisher)
        .handle(&envelope, &context)
        .await
        .context("Event handling failed")?;
    Ok(())
}
