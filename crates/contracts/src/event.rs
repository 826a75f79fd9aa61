//! TelemetryEvent - Dispatcher input, LogRecord - persistent sink payload

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Severity;

/// Structured event submitted by callers.
///
/// Carries no timestamp: the dispatcher stamps it on ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    /// Caller-chosen namespace (e.g. "AUTH", "UPLOAD")
    pub category: String,

    /// Short verb describing what happened
    pub action: String,

    /// Human-readable message
    pub message: String,

    /// Event severity
    #[serde(default)]
    pub severity: Severity,

    /// Free-form diagnostic payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl TelemetryEvent {
    /// Create an event without context
    pub fn new(
        category: impl Into<String>,
        action: impl Into<String>,
        message: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            category: category.into(),
            action: action.into(),
            message: message.into(),
            severity,
            context: None,
        }
    }

    /// Attach a diagnostic context
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }
}

/// Event as received from an untrusted boundary.
///
/// `severity` is a free-form tag; the dispatcher resolves it and falls back
/// to `info` when it is not recognized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    pub category: String,
    pub action: String,
    pub message: String,
    pub severity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl RawEvent {
    /// Convert to a typed event with the resolved severity
    pub fn into_event(self, severity: Severity) -> TelemetryEvent {
        TelemetryEvent {
            category: self.category,
            action: self.action,
            message: self.message,
            severity,
            context: self.context,
        }
    }
}

/// Stamped event, one row of a persisted batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub category: String,
    pub action: String,
    pub message: String,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
    pub timestamp: DateTime<Utc>,
}

impl LogRecord {
    /// Stamp an event
    pub fn from_event(event: TelemetryEvent, timestamp: DateTime<Utc>) -> Self {
        Self {
            category: event.category,
            action: event.action,
            message: event.message,
            severity: event.severity,
            context: event.context,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_raw_event_from_json_line() {
        let line = r#"{"category":"UPLOAD","action":"failed","message":"disk full","severity":"ERROR","context":{"bytes":42}}"#;
        let raw: RawEvent = serde_json::from_str(line).unwrap();
        assert_eq!(raw.severity, "ERROR");
        let event = raw.into_event(Severity::Error);
        assert_eq!(event.context, Some(json!({"bytes": 42})));
    }

    #[test]
    fn test_log_record_serializes_timestamp() {
        let event = TelemetryEvent::new("AUTH", "login", "ok", Severity::Success);
        let record = LogRecord::from_event(event, Utc::now());
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["severity"], "success");
        assert!(value["timestamp"].is_string());
        assert!(value.get("context").is_none());
    }
}
