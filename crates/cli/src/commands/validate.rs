//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::TelemetryConfig;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    min_severity_for_persist: String,
    min_severity_for_alert: String,
    min_severity_for_notify: String,
    alert_sample_rate: f64,
    batch_size: usize,
    flush_interval_ms: u64,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(ConfigSummary {
                    version: format!("{:?}", config.version),
                    min_severity_for_persist: config.routing.min_severity_for_persist.to_string(),
                    min_severity_for_alert: config.routing.min_severity_for_alert.to_string(),
                    min_severity_for_notify: config.routing.min_severity_for_notify.to_string(),
                    alert_sample_rate: config.routing.alert_sample_rate,
                    batch_size: config.batch.batch_size,
                    flush_interval_ms: config.batch.flush_interval_ms,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &TelemetryConfig) -> Vec<String> {
    let mut warnings = Vec::new();
    let routing = &config.routing;

    if routing.alert_sample_rate == 0.0 {
        warnings.push(
            "alert_sample_rate is 0 - only critical events will reach the alert sink".to_string(),
        );
    }

    if !config.features.enable_persistent_sink {
        warnings.push("Persistent sink disabled - no events will be stored".to_string());
    }

    if !config.features.enable_alert_sink {
        warnings.push("Alert sink disabled - persistence failures will only be logged".to_string());
    }

    if routing.min_severity_for_alert < routing.min_severity_for_persist {
        warnings.push(format!(
            "min_severity_for_alert ({}) is below min_severity_for_persist ({}) - some alerts will have no stored record",
            routing.min_severity_for_alert, routing.min_severity_for_persist
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!(
                "  Thresholds: persist >= {}, alert >= {}, notify >= {}",
                summary.min_severity_for_persist,
                summary.min_severity_for_alert,
                summary.min_severity_for_notify
            );
            println!("  Alert sample rate: {}", summary.alert_sample_rate);
            println!(
                "  Batching: {} records / {} ms",
                summary.batch_size, summary.flush_interval_ms
            );
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{RoutingRules, Severity};

    #[test]
    fn test_default_config_has_no_warnings() {
        let config = TelemetryConfig::with_rules(RoutingRules::default());
        assert!(collect_warnings(&config).is_empty());
    }

    #[test]
    fn test_warns_on_zero_rate_and_inverted_thresholds() {
        let rules = RoutingRules {
            min_severity_for_persist: Severity::Error,
            min_severity_for_alert: Severity::Warning,
            alert_sample_rate: 0.0,
            ..Default::default()
        };
        let warnings = collect_warnings(&TelemetryConfig::with_rules(rules));
        assert_eq!(warnings.len(), 2);
    }
}
