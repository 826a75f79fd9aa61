//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{SinkType, TelemetryConfig};
use dispatcher::routing_table;
use serde::Serialize;
use std::collections::HashMap;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    alert_sample_rate: f64,
    routing: Vec<RouteInfo>,
    batch: BatchInfo,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sinks: Vec<SinkInfo>,
}

#[derive(Serialize)]
struct RouteInfo {
    severity: String,
    persist: bool,
    alert: bool,
    notify: bool,
    sampled: bool,
}

#[derive(Serialize)]
struct BatchInfo {
    batch_size: usize,
    flush_interval_ms: u64,
    queue_capacity: usize,
}

#[derive(Serialize)]
struct SinkInfo {
    role: String,
    name: String,
    sink_type: SinkType,
    enabled: bool,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    params: HashMap<String, String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let info = build_config_info(&config, args.sinks);
    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn build_config_info(config: &TelemetryConfig, with_sinks: bool) -> ConfigInfo {
    let rate = config.routing.alert_sample_rate;
    let routing = routing_table(&config.routing)
        .into_iter()
        .map(|(severity, decision)| RouteInfo {
            severity: severity.to_string(),
            persist: decision.persist,
            alert: decision.alert,
            notify: decision.notify,
            sampled: decision.alert && !severity.is_critical() && rate < 1.0,
        })
        .collect();

    let features = &config.features;
    let sinks = if with_sinks {
        config
            .sinks
            .iter()
            .map(|(role, sink)| SinkInfo {
                role: role.to_string(),
                name: sink.name.clone(),
                sink_type: sink.sink_type,
                enabled: match role {
                    contracts::SinkRole::Persist => features.enable_persistent_sink,
                    contracts::SinkRole::Alert => features.enable_alert_sink,
                    contracts::SinkRole::Notify => true,
                },
                params: sink.params.clone(),
            })
            .collect()
    } else {
        Vec::new()
    };

    ConfigInfo {
        version: format!("{:?}", config.version),
        alert_sample_rate: rate,
        routing,
        batch: BatchInfo {
            batch_size: config.batch.batch_size,
            flush_interval_ms: config.batch.flush_interval_ms,
            queue_capacity: config.batch.queue_capacity,
        },
        sinks,
    }
}

fn print_config_info(info: &ConfigInfo) {
    fn mark(on: bool) -> &'static str {
        if on { "✓" } else { "·" }
    }

    println!("\n=== Telemetry Router Configuration ===\n");
    println!("Version: {}", info.version);
    println!("Alert sample rate: {}", info.alert_sample_rate);

    println!("\nRouting:");
    println!("  {:<10} {:^8} {:^8} {:^8}", "severity", "persist", "alert", "notify");
    for route in &info.routing {
        let alert = if route.sampled {
            format!("{}*", mark(route.alert))
        } else {
            mark(route.alert).to_string()
        };
        println!(
            "  {:<10} {:^8} {:^8} {:^8}",
            route.severity,
            mark(route.persist),
            alert,
            mark(route.notify)
        );
    }
    if info.routing.iter().any(|r| r.sampled) {
        println!("  (* sampled at {})", info.alert_sample_rate);
    }

    println!("\nBatching:");
    println!("  Batch size: {}", info.batch.batch_size);
    println!("  Flush interval: {} ms", info.batch.flush_interval_ms);
    println!("  Queue capacity: {}", info.batch.queue_capacity);

    if !info.sinks.is_empty() {
        println!("\nSinks:");
        for sink in &info.sinks {
            let state = if sink.enabled { "" } else { " [disabled]" };
            println!(
                "  - {}: {} ({:?}){}",
                sink.role, sink.name, sink.sink_type, state
            );
            for (key, value) in &sink.params {
                println!("      {} = {}", key, value);
            }
        }
    }

    println!();
}
