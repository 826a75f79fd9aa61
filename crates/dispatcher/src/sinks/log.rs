//! LogSink - writes telemetry through tracing

use contracts::{
    AlertSink, ContractError, LogRecord, Notification, NotificationSink, PersistentLogSink,
    Severity,
};
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

/// Sink that logs batches, alerts and notifications
///
/// Default binding for every role; useful as console output and in
/// environments without a real backend.
pub struct LogSink {
    name: String,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn log_batch_summary(&self, records: &[LogRecord]) {
        let highest = records.iter().map(|r| r.severity).max();
        info!(
            sink = %self.name,
            records = records.len(),
            highest = ?highest,
            first = ?records.first().map(|r| r.timestamp),
            last = ?records.last().map(|r| r.timestamp),
            "Log batch persisted"
        );
        for record in records {
            debug!(
                sink = %self.name,
                category = %record.category,
                action = %record.action,
                severity = %record.severity,
                "{}",
                record.message
            );
        }
    }
}

impl PersistentLogSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write_batch",
        skip(self, records),
        fields(sink = %self.name, records = records.len())
    )]
    async fn write_batch(&mut self, records: &[LogRecord]) -> Result<(), ContractError> {
        self.log_batch_summary(records);
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, "LogSink closed");
        Ok(())
    }
}

impl AlertSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn capture_message(
        &self,
        message: &str,
        severity: Severity,
        context: Option<&Value>,
    ) -> Result<(), ContractError> {
        match severity {
            Severity::Critical | Severity::Error => {
                error!(sink = %self.name, %severity, context = ?context, "ALERT: {message}")
            }
            _ => warn!(sink = %self.name, %severity, context = ?context, "ALERT: {message}"),
        }
        Ok(())
    }
}

impl NotificationSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn notify(&self, notification: &Notification) -> Result<(), ContractError> {
        info!(
            sink = %self.name,
            severity = %notification.severity,
            category = %notification.category,
            sound = notification.channels.sound,
            desktop = notification.channels.desktop,
            "NOTIFY: {}",
            notification.message
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use contracts::{DeliveryChannels, TelemetryEvent};

    #[tokio::test]
    async fn test_log_sink_write_batch() {
        let mut sink = LogSink::new("test_log");
        let record = LogRecord::from_event(
            TelemetryEvent::new("AUTH", "login", "user signed in", Severity::Info),
            Utc::now(),
        );

        let result = sink.write_batch(&[record]).await;
        assert!(result.is_ok());
        assert!(sink.close().await.is_ok());
    }

    #[test]
    fn test_log_sink_alert_and_notify() {
        let sink = LogSink::new("my_logger");
        assert_eq!(AlertSink::name(&sink), "my_logger");
        assert!(sink
            .capture_message("db down", Severity::Critical, None)
            .is_ok());

        let notification = Notification {
            severity: Severity::Warning,
            category: "UPLOAD".into(),
            message: "slow upload".into(),
            channels: DeliveryChannels::default(),
        };
        assert!(sink.notify(&notification).is_ok());
    }
}
