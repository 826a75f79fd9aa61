//! MemorySink - recording sink for tests and embedding
//!
//! Clones share state: keep one clone, hand the other to the dispatcher.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use contracts::{
    AlertSink, ContractError, LogRecord, Notification, NotificationSink, PersistentLogSink,
    Severity,
};
use parking_lot::Mutex;
use serde_json::Value;

/// Alert as received by a MemorySink
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedAlert {
    pub message: String,
    pub severity: Severity,
    pub context: Option<Value>,
}

#[derive(Debug, Default)]
struct Recorded {
    batches: Vec<Vec<LogRecord>>,
    alerts: Vec<CapturedAlert>,
    notifications: Vec<Notification>,
    closed: bool,
}

#[derive(Debug, Default)]
struct Failures {
    writes: AtomicBool,
    alerts: AtomicBool,
    notifications: AtomicBool,
}

/// In-memory sink implementing all three roles
#[derive(Debug, Clone)]
pub struct MemorySink {
    name: String,
    recorded: Arc<Mutex<Recorded>>,
    failures: Arc<Failures>,
    write_delay: Option<Duration>,
}

impl MemorySink {
    /// Create a new MemorySink
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            recorded: Arc::default(),
            failures: Arc::default(),
            write_delay: None,
        }
    }

    /// Make every `write_batch` take at least `delay`
    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = Some(delay);
        self
    }

    pub fn fail_writes(&self, fail: bool) {
        self.failures.writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_alerts(&self, fail: bool) {
        self.failures.alerts.store(fail, Ordering::SeqCst);
    }

    pub fn fail_notifications(&self, fail: bool) {
        self.failures.notifications.store(fail, Ordering::SeqCst);
    }

    /// Successfully written batches, in write order
    pub fn batches(&self) -> Vec<Vec<LogRecord>> {
        self.recorded.lock().batches.clone()
    }

    /// All persisted records, flattened
    pub fn records(&self) -> Vec<LogRecord> {
        self.recorded.lock().batches.concat()
    }

    pub fn alerts(&self) -> Vec<CapturedAlert> {
        self.recorded.lock().alerts.clone()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.recorded.lock().notifications.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.recorded.lock().closed
    }
}

impl PersistentLogSink for MemorySink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write_batch(&mut self, records: &[LogRecord]) -> Result<(), ContractError> {
        if let Some(delay) = self.write_delay {
            tokio::time::sleep(delay).await;
        }
        if self.failures.writes.load(Ordering::SeqCst) {
            return Err(ContractError::sink_write(&self.name, "injected write failure"));
        }
        self.recorded.lock().batches.push(records.to_vec());
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        self.recorded.lock().closed = true;
        Ok(())
    }
}

impl AlertSink for MemorySink {
    fn name(&self) -> &str {
        &self.name
    }

    fn capture_message(
        &self,
        message: &str,
        severity: Severity,
        context: Option<&Value>,
    ) -> Result<(), ContractError> {
        if self.failures.alerts.load(Ordering::SeqCst) {
            return Err(ContractError::sink_connection(&self.name, "injected alert failure"));
        }
        self.recorded.lock().alerts.push(CapturedAlert {
            message: message.to_string(),
            severity,
            context: context.cloned(),
        });
        Ok(())
    }
}

impl NotificationSink for MemorySink {
    fn name(&self) -> &str {
        &self.name
    }

    fn notify(&self, notification: &Notification) -> Result<(), ContractError> {
        if self.failures.notifications.load(Ordering::SeqCst) {
            return Err(ContractError::sink_connection(
                &self.name,
                "injected notification failure",
            ));
        }
        self.recorded.lock().notifications.push(notification.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use contracts::TelemetryEvent;

    #[tokio::test]
    async fn test_clones_share_state() {
        let observer = MemorySink::new("mem");
        let mut sink = observer.clone();

        let record = LogRecord::from_event(
            TelemetryEvent::new("AUTH", "login", "ok", Severity::Info),
            Utc::now(),
        );
        sink.write_batch(&[record]).await.unwrap();
        assert_eq!(observer.records().len(), 1);

        observer.fail_writes(true);
        assert!(sink.write_batch(&[]).await.is_err());
        assert_eq!(observer.batches().len(), 1);
    }

    #[test]
    fn test_alert_failure_injection() {
        let sink = MemorySink::new("mem");
        sink.fail_alerts(true);
        assert!(sink
            .capture_message("boom", Severity::Error, None)
            .is_err());
        assert!(sink.alerts().is_empty());
    }
}
