//! TelemetryConfig - Config Loader output
//!
//! Describes the complete process-wide telemetry setup: routing thresholds,
//! batching, feature toggles and the sink binding for each role.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use crate::RoutingRules;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete telemetry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Routing thresholds. Required: rules are never guessed.
    pub routing: RoutingRules,

    /// Batch buffer thresholds
    #[serde(default)]
    pub batch: BatchConfig,

    /// Feature toggles
    #[serde(default)]
    pub features: FeatureToggles,

    /// Sink binding per role
    #[serde(default)]
    pub sinks: SinkBindings,
}

impl TelemetryConfig {
    /// Configuration with default rules and log sinks everywhere
    pub fn with_rules(routing: RoutingRules) -> Self {
        Self {
            version: ConfigVersion::V1,
            routing,
            batch: BatchConfig::default(),
            features: FeatureToggles::default(),
            sinks: SinkBindings::default(),
        }
    }
}

/// Batch buffer thresholds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Flush as soon as this many records are pending
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Flush this long after the first record lands in an empty buffer
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,

    /// Capacity of the enqueue channel into the buffer worker
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_batch_size() -> usize {
    50
}

fn default_flush_interval_ms() -> u64 {
    5_000
}

fn default_queue_capacity() -> usize {
    10_000
}

impl BatchConfig {
    /// Largest accepted `batch_size`
    pub const MAX_BATCH_SIZE: usize = 100_000;

    /// Largest accepted `queue_capacity`
    pub const MAX_QUEUE_CAPACITY: usize = 1_000_000;

    /// Flush interval as a `Duration`
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            flush_interval_ms: default_flush_interval_ms(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

/// Feature toggles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureToggles {
    #[serde(default = "default_true")]
    pub enable_alert_sink: bool,

    #[serde(default = "default_true")]
    pub enable_persistent_sink: bool,

    /// Echo every tracked event through `tracing`
    #[serde(default)]
    pub enable_console_echo: bool,
}

fn default_true() -> bool {
    true
}

impl Default for FeatureToggles {
    fn default() -> Self {
        Self {
            enable_alert_sink: true,
            enable_persistent_sink: true,
            enable_console_echo: false,
        }
    }
}

/// Sink binding per role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkBindings {
    #[serde(default = "default_persist_binding")]
    pub persist: SinkConfig,

    #[serde(default = "default_alert_binding")]
    pub alert: SinkConfig,

    #[serde(default = "default_notify_binding")]
    pub notify: SinkConfig,
}

fn default_persist_binding() -> SinkConfig {
    SinkConfig::log("persist_log")
}

fn default_alert_binding() -> SinkConfig {
    SinkConfig::log("alert_log")
}

fn default_notify_binding() -> SinkConfig {
    SinkConfig::log("notify_log")
}

impl Default for SinkBindings {
    fn default() -> Self {
        Self {
            persist: default_persist_binding(),
            alert: default_alert_binding(),
            notify: default_notify_binding(),
        }
    }
}

impl SinkBindings {
    /// Iterate bindings with their role
    pub fn iter(&self) -> impl Iterator<Item = (SinkRole, &SinkConfig)> {
        [
            (SinkRole::Persist, &self.persist),
            (SinkRole::Alert, &self.alert),
            (SinkRole::Notify, &self.notify),
        ]
        .into_iter()
    }
}

/// Sink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink name
    pub name: String,

    /// Sink type
    pub sink_type: SinkType,

    /// Type-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

impl SinkConfig {
    /// Log sink binding with no parameters
    pub fn log(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sink_type: SinkType::Log,
            params: HashMap::new(),
        }
    }
}

/// Sink type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// `tracing` output
    Log,
    /// JSON-lines file
    File,
    /// UDP datagrams
    Network,
}

impl SinkType {
    /// Whether this sink type can serve the given role
    pub fn supports(&self, role: SinkRole) -> bool {
        match self {
            SinkType::Log => true,
            SinkType::File => role == SinkRole::Persist,
            SinkType::Network => role != SinkRole::Persist,
        }
    }
}

/// Role a sink plays for the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SinkRole {
    Persist,
    Alert,
    Notify,
}

impl fmt::Display for SinkRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkRole::Persist => f.write_str("persist"),
            SinkRole::Alert => f.write_str("alert"),
            SinkRole::Notify => f.write_str("notify"),
        }
    }
}
