//! Config validation
//!
//! Rules:
//! - alert_sample_rate within [0, 1]
//! - batch_size > 0, flush_interval_ms > 0
//! - queue_capacity >= batch_size
//! - batch_size and queue_capacity within their upper bounds
//! - every sink binding named, and its type valid for its role
//! - file sinks carry a `path`, network sinks an `addr`

use contracts::{BatchConfig, ContractError, SinkType, TelemetryConfig};

/// Validate a TelemetryConfig
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &TelemetryConfig) -> Result<(), ContractError> {
    validate_routing(config)?;
    validate_batch(config)?;
    validate_sinks(config)?;
    Ok(())
}

/// Validate routing thresholds
fn validate_routing(config: &TelemetryConfig) -> Result<(), ContractError> {
    let rate = config.routing.alert_sample_rate;
    if !(0.0..=1.0).contains(&rate) {
        return Err(ContractError::config_validation(
            "routing.alert_sample_rate",
            format!("alert_sample_rate must be within [0, 1], got {rate}"),
        ));
    }
    Ok(())
}

/// Validate batch thresholds
fn validate_batch(config: &TelemetryConfig) -> Result<(), ContractError> {
    let batch = &config.batch;

    if batch.batch_size == 0 {
        return Err(ContractError::config_validation(
            "batch.batch_size",
            "batch_size must be > 0",
        ));
    }

    if batch.batch_size > BatchConfig::MAX_BATCH_SIZE {
        return Err(ContractError::config_validation(
            "batch.batch_size",
            format!(
                "batch_size ({}) must be <= {}",
                batch.batch_size,
                BatchConfig::MAX_BATCH_SIZE
            ),
        ));
    }

    if batch.flush_interval_ms == 0 {
        return Err(ContractError::config_validation(
            "batch.flush_interval_ms",
            "flush_interval_ms must be > 0",
        ));
    }

    if batch.queue_capacity > BatchConfig::MAX_QUEUE_CAPACITY {
        return Err(ContractError::config_validation(
            "batch.queue_capacity",
            format!(
                "queue_capacity ({}) must be <= {}",
                batch.queue_capacity,
                BatchConfig::MAX_QUEUE_CAPACITY
            ),
        ));
    }

    if batch.queue_capacity < batch.batch_size {
        return Err(ContractError::config_validation(
            "batch.queue_capacity",
            format!(
                "queue_capacity ({}) must be >= batch_size ({})",
                batch.queue_capacity, batch.batch_size
            ),
        ));
    }

    Ok(())
}

/// Validate sink bindings
fn validate_sinks(config: &TelemetryConfig) -> Result<(), ContractError> {
    for (role, sink) in config.sinks.iter() {
        if sink.name.is_empty() {
            return Err(ContractError::config_validation(
                format!("sinks.{role}.name"),
                "sink name cannot be empty",
            ));
        }

        if !sink.sink_type.supports(role) {
            return Err(ContractError::config_validation(
                format!("sinks.{role}.sink_type"),
                format!("sink type {:?} cannot serve the {role} role", sink.sink_type),
            ));
        }

        let required = match sink.sink_type {
            SinkType::Log => None,
            SinkType::File => Some("path"),
            SinkType::Network => Some("addr"),
        };
        if let Some(param) = required {
            if !sink.params.contains_key(param) {
                return Err(ContractError::config_validation(
                    format!("sinks.{role}.params.{param}"),
                    format!("{:?} sink requires '{param}'", sink.sink_type),
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{RoutingRules, SinkConfig};

    fn minimal_config() -> TelemetryConfig {
        TelemetryConfig::with_rules(RoutingRules::default())
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&minimal_config()).is_ok());
    }

    #[test]
    fn test_sample_rate_out_of_range() {
        let mut config = minimal_config();
        config.routing.alert_sample_rate = 1.5;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("alert_sample_rate"), "got: {err}");

        config.routing.alert_sample_rate = -0.1;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_batch_size() {
        let mut config = minimal_config();
        config.batch.batch_size = 0;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("batch_size must be > 0"), "got: {err}");
    }

    #[test]
    fn test_zero_flush_interval() {
        let mut config = minimal_config();
        config.batch.flush_interval_ms = 0;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("flush_interval_ms"), "got: {err}");
    }

    #[test]
    fn test_queue_smaller_than_batch() {
        let mut config = minimal_config();
        config.batch.batch_size = 100;
        config.batch.queue_capacity = 10;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("queue_capacity"), "got: {err}");
    }

    #[test]
    fn test_batch_thresholds_upper_bound() {
        let mut config = minimal_config();
        config.batch.batch_size = 1 << 40;
        config.batch.queue_capacity = 1 << 40;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("batch_size"), "got: {err}");

        config.batch.batch_size = BatchConfig::MAX_BATCH_SIZE;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("queue_capacity"), "got: {err}");

        config.batch.queue_capacity = BatchConfig::MAX_QUEUE_CAPACITY;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_file_sink_cannot_alert() {
        let mut config = minimal_config();
        config.sinks.alert = SinkConfig {
            name: "alerts".into(),
            sink_type: SinkType::File,
            params: [("path".to_string(), "/tmp/a".to_string())].into(),
        };
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("cannot serve the alert role"), "got: {err}");
    }

    #[test]
    fn test_network_sink_requires_addr() {
        let mut config = minimal_config();
        config.sinks.notify = SinkConfig {
            name: "toast".into(),
            sink_type: SinkType::Network,
            params: Default::default(),
        };
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("requires 'addr'"), "got: {err}");
    }

    #[test]
    fn test_empty_sink_name() {
        let mut config = minimal_config();
        config.sinks.persist.name = String::new();
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("cannot be empty"), "got: {err}");
    }
}
