//! Sink traits - Dispatcher output interfaces
//!
//! One capability per output port. The dispatcher never assumes a backend.

use serde_json::Value;

use crate::{ContractError, LogRecord, Notification, Severity};

/// Persistent log store
///
/// Owned by the batch buffer worker; the only caller is a flush.
#[trait_variant::make(PersistentLogSink: Send)]
pub trait LocalPersistentLogSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write one batch, preserving record order
    ///
    /// # Errors
    /// Returns write error (should include context). The batch is not retried.
    async fn write_batch(&mut self, records: &[LogRecord]) -> Result<(), ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}

/// Error-tracking service
///
/// Fire-and-forget: implementations must return without waiting on the network.
pub trait AlertSink: Send + Sync {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Forward one alert
    fn capture_message(
        &self,
        message: &str,
        severity: Severity,
        context: Option<&Value>,
    ) -> Result<(), ContractError>;
}

/// User-facing notification (toast/sound)
pub trait NotificationSink: Send + Sync {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Deliver one notification
    fn notify(&self, notification: &Notification) -> Result<(), ContractError>;
}
