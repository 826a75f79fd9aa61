//! RoutingRules - static routing thresholds, RoutingDecision - classifier output

use serde::{Deserialize, Serialize};

use crate::Severity;

/// Severity thresholds and alert sampling.
///
/// Loaded once at process start and never mutated. Reload means building a
/// new dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingRules {
    /// Lowest severity reaching the persistent log sink
    #[serde(default = "default_min_persist")]
    pub min_severity_for_persist: Severity,

    /// Lowest severity reaching the alert sink
    #[serde(default = "default_min_alert")]
    pub min_severity_for_alert: Severity,

    /// Lowest severity triggering a notification
    #[serde(default = "default_min_notify", alias = "min_severity_for_toast")]
    pub min_severity_for_notify: Severity,

    /// Fraction in [0, 1] of non-critical alert-eligible events forwarded
    #[serde(default = "default_alert_sample_rate")]
    pub alert_sample_rate: f64,
}

fn default_min_persist() -> Severity {
    Severity::Info
}

fn default_min_alert() -> Severity {
    Severity::Error
}

fn default_min_notify() -> Severity {
    Severity::Warning
}

fn default_alert_sample_rate() -> f64 {
    1.0
}

impl Default for RoutingRules {
    fn default() -> Self {
        Self {
            min_severity_for_persist: default_min_persist(),
            min_severity_for_alert: default_min_alert(),
            min_severity_for_notify: default_min_notify(),
            alert_sample_rate: default_alert_sample_rate(),
        }
    }
}

/// Which sinks an event reaches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RoutingDecision {
    pub persist: bool,
    pub alert: bool,
    pub notify: bool,
}

impl RoutingDecision {
    /// True when no sink fires
    pub fn is_empty(&self) -> bool {
        !(self.persist || self.alert || self.notify)
    }
}
