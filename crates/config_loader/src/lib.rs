//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Validate configuration legality
//! - Generate `TelemetryConfig` and `NotificationPreferences`
//!
//! A load failure is fatal: callers must not fall back to guessed routing rules.
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let config = ConfigLoader::load_from_path(Path::new("telemetry.toml")).unwrap();
//! println!("Batch size: {}", config.batch.batch_size);
//! ```

mod parser;
mod validator;

pub use contracts::{NotificationPreferences, TelemetryConfig};
pub use parser::ConfigFormat;

use contracts::ContractError;
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::debug;

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<TelemetryConfig, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        debug!(path = %path.display(), ?format, "Loading telemetry config");
        Self::load_from_str(&content, format)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<TelemetryConfig, ContractError> {
        let config = parser::parse(content, format)?;
        validator::validate(&config)?;
        Ok(config)
    }

    /// Re-validate a configuration after in-memory overrides
    pub fn validate(config: &TelemetryConfig) -> Result<(), ContractError> {
        validator::validate(config)
    }

    /// Load notification preferences from file path
    pub fn load_preferences_from_path(
        path: &Path,
    ) -> Result<NotificationPreferences, ContractError> {
        Self::load_document(path)
    }

    /// Serialize TelemetryConfig to TOML string
    pub fn to_toml(config: &TelemetryConfig) -> Result<String, ContractError> {
        toml::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize TelemetryConfig to JSON string
    pub fn to_json(config: &TelemetryConfig) -> Result<String, ContractError> {
        serde_json::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }

    fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        parser::parse(&content, format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{Severity, SinkType};
    use std::io::Write;

    const MINIMAL_TOML: &str = r#"
[routing]
min_severity_for_persist = "info"
min_severity_for_alert = "error"
min_severity_for_notify = "warning"
alert_sample_rate = 0.5

[batch]
batch_size = 20
flush_interval_ms = 1000

[features]
enable_console_echo = true

[sinks.persist]
name = "events_file"
sink_type = "file"
params = { path = "/var/log/telemetry.jsonl" }

[sinks.alert]
name = "tracker"
sink_type = "network"
params = { addr = "127.0.0.1:9999" }
"#;

    #[test]
    fn test_load_from_str_toml() {
        let result = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.routing.alert_sample_rate, 0.5);
        assert_eq!(config.batch.batch_size, 20);
        assert!(config.features.enable_console_echo);
        assert!(config.features.enable_alert_sink);
        assert_eq!(config.sinks.alert.sink_type, SinkType::Network);
        assert_eq!(config.sinks.notify.sink_type, SinkType::Log);
    }

    #[test]
    fn test_round_trip_toml() {
        let config = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&config).unwrap();
        let config2 = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(config.routing, config2.routing);
        assert_eq!(config.batch, config2.batch);
    }

    #[test]
    fn test_round_trip_json() {
        let config = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&config).unwrap();
        let config2 = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(config.sinks.persist.name, config2.sinks.persist.name);
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = r#"
[routing]
alert_sample_rate = 2.0
"#;
        let result = ConfigLoader::load_from_str(content, ConfigFormat::Toml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("alert_sample_rate"));
    }

    #[test]
    fn test_load_from_path() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(MINIMAL_TOML.as_bytes()).unwrap();
        let config = ConfigLoader::load_from_path(file.path()).unwrap();
        assert_eq!(config.routing.min_severity_for_alert, Severity::Error);
    }

    #[test]
    fn test_load_from_path_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        let err = ConfigLoader::load_from_path(file.path()).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }

    #[test]
    fn test_load_preferences() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(br#"{"do_not_disturb": true, "categories": {"UPLOAD": false}}"#)
            .unwrap();
        let prefs = ConfigLoader::load_preferences_from_path(file.path()).unwrap();
        assert!(prefs.do_not_disturb);
        assert!(prefs.sound);
        assert!(!prefs.category_enabled("UPLOAD"));
    }
}
