//! Dispatcher setup shared by `run` and `emit`.

use anyhow::{Context, Result};
use config_loader::ConfigLoader;
use contracts::TelemetryConfig;
use dispatcher::{create_dispatcher, PreferenceHandle, ShutdownReport, TelemetryDispatcher};
use serde::Serialize;
use tracing::info;

use crate::cli::RouterArgs;

/// Load configuration and apply CLI overrides
pub fn load_config(args: &RouterArgs) -> Result<TelemetryConfig> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let mut config = ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if let Some(batch_size) = args.batch_size {
        info!(batch_size, "Overriding batch size from CLI");
        config.batch.batch_size = batch_size;
    }
    if let Some(interval) = args.flush_interval_ms {
        info!(flush_interval_ms = interval, "Overriding flush interval from CLI");
        config.batch.flush_interval_ms = interval;
    }
    if let Some(rate) = args.sample_rate {
        info!(sample_rate = rate, "Overriding alert sample rate from CLI");
        config.routing.alert_sample_rate = rate;
    }
    if args.echo {
        config.features.enable_console_echo = true;
    }

    ConfigLoader::validate(&config).context("Invalid configuration after CLI overrides")?;
    Ok(config)
}

/// Build a dispatcher from CLI arguments
pub async fn build_dispatcher(args: &RouterArgs) -> Result<TelemetryDispatcher> {
    let config = load_config(args)?;

    let preferences = match &args.preferences {
        Some(path) => {
            let prefs = ConfigLoader::load_preferences_from_path(path).with_context(|| {
                format!("Failed to load preferences from {}", path.display())
            })?;
            PreferenceHandle::new(prefs)
        }
        None => PreferenceHandle::default(),
    };

    create_dispatcher(config, preferences)
        .await
        .context("Failed to create dispatcher")
}

/// Routing summary for JSON output
#[derive(Serialize)]
struct ReportJson<'a> {
    #[serde(flatten)]
    metrics: &'a dispatcher::DispatchMetricsSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    mean_flush_latency_ms: Option<f64>,
}

/// Print the shutdown report
pub fn print_report(report: &ShutdownReport, json: bool) -> Result<()> {
    if json {
        let out = ReportJson {
            metrics: &report.metrics,
            mean_flush_latency_ms: report
                .flush
                .as_ref()
                .filter(|f| f.total_batches > 0)
                .map(|f| f.latency_ms.mean),
        };
        let json = serde_json::to_string_pretty(&out).context("Failed to serialize report")?;
        println!("{}", json);
        return Ok(());
    }

    let m = &report.metrics;
    println!("\n=== Routing Summary ===");
    println!("Events tracked: {}", m.events_tracked);
    if m.severity_anomalies > 0 {
        println!("Severity anomalies: {}", m.severity_anomalies);
    }
    println!(
        "Alerts: {} sent, {} sampled out, {} failed",
        m.alerts_sent, m.alerts_sampled_out, m.alert_failures
    );
    println!(
        "Notifications: {} sent, {} suppressed, {} failed",
        m.notifications_sent, m.notifications_suppressed, m.notification_failures
    );
    println!(
        "Records: {} enqueued, {} persisted, {} lost, {} dropped (queue full)",
        m.records_enqueued, m.records_persisted, m.records_lost, m.records_queue_dropped
    );
    if let Some(flush) = &report.flush {
        println!("\n{}", flush);
    }
    Ok(())
}
