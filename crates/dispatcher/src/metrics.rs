//! Dispatch metrics for observability
//!
//! Local atomic counters, mirrored to the `metrics` recorder through
//! `observability`.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use contracts::Severity;
use serde::Serialize;

/// Outcome of an alert-eligible event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertOutcome {
    Sent,
    SampledOut,
    Failed,
}

impl AlertOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            AlertOutcome::Sent => "sent",
            AlertOutcome::SampledOut => "sampled_out",
            AlertOutcome::Failed => "failed",
        }
    }
}

/// Outcome of a notify-eligible event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    Sent,
    Suppressed,
    Failed,
}

impl NotifyOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            NotifyOutcome::Sent => "sent",
            NotifyOutcome::Suppressed => "suppressed",
            NotifyOutcome::Failed => "failed",
        }
    }
}

/// Counters shared by the dispatcher and its buffer worker
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    events_tracked: AtomicU64,
    severity_anomalies: AtomicU64,
    /// Current pending records in the batch buffer
    pending: AtomicUsize,
    records_enqueued: AtomicU64,
    /// Records rejected because the buffer queue was full
    records_queue_dropped: AtomicU64,
    batches_flushed: AtomicU64,
    batch_failures: AtomicU64,
    records_persisted: AtomicU64,
    /// Records discarded with a failed batch
    records_lost: AtomicU64,
    alerts_sent: AtomicU64,
    alerts_sampled_out: AtomicU64,
    alert_failures: AtomicU64,
    notifications_sent: AtomicU64,
    notifications_suppressed: AtomicU64,
    notification_failures: AtomicU64,
}

impl DispatchMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_tracked(&self, severity: Severity) {
        self.events_tracked.fetch_add(1, Ordering::Relaxed);
        observability::record_event_tracked(severity);
    }

    pub fn record_anomaly(&self) {
        self.severity_anomalies.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_enqueued(&self) {
        self.records_enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_queue_dropped(&self) {
        self.records_queue_dropped.fetch_add(1, Ordering::Relaxed);
        observability::record_records_dropped("queue_full", 1);
    }

    /// Set current pending count
    pub fn set_pending(&self, pending: usize) {
        self.pending.store(pending, Ordering::Relaxed);
        observability::record_buffer_depth(pending);
    }

    /// Record one batch write
    pub fn record_flush(&self, batch_size: usize, latency_ms: f64, success: bool) {
        if success {
            self.batches_flushed.fetch_add(1, Ordering::Relaxed);
            self.records_persisted
                .fetch_add(batch_size as u64, Ordering::Relaxed);
        } else {
            self.batch_failures.fetch_add(1, Ordering::Relaxed);
            self.records_lost
                .fetch_add(batch_size as u64, Ordering::Relaxed);
            observability::record_records_dropped("write_failed", batch_size);
        }
        observability::record_batch_flushed(batch_size, latency_ms, success);
    }

    pub fn record_alert(&self, outcome: AlertOutcome) {
        let counter = match outcome {
            AlertOutcome::Sent => &self.alerts_sent,
            AlertOutcome::SampledOut => &self.alerts_sampled_out,
            AlertOutcome::Failed => &self.alert_failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        observability::record_alert(outcome.as_str());
    }

    pub fn record_notification(&self, outcome: NotifyOutcome) {
        let counter = match outcome {
            NotifyOutcome::Sent => &self.notifications_sent,
            NotifyOutcome::Suppressed => &self.notifications_suppressed,
            NotifyOutcome::Failed => &self.notification_failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        observability::record_notification(outcome.as_str());
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> DispatchMetricsSnapshot {
        DispatchMetricsSnapshot {
            events_tracked: self.events_tracked.load(Ordering::Relaxed),
            severity_anomalies: self.severity_anomalies.load(Ordering::Relaxed),
            pending: self.pending.load(Ordering::Relaxed),
            records_enqueued: self.records_enqueued.load(Ordering::Relaxed),
            records_queue_dropped: self.records_queue_dropped.load(Ordering::Relaxed),
            batches_flushed: self.batches_flushed.load(Ordering::Relaxed),
            batch_failures: self.batch_failures.load(Ordering::Relaxed),
            records_persisted: self.records_persisted.load(Ordering::Relaxed),
            records_lost: self.records_lost.load(Ordering::Relaxed),
            alerts_sent: self.alerts_sent.load(Ordering::Relaxed),
            alerts_sampled_out: self.alerts_sampled_out.load(Ordering::Relaxed),
            alert_failures: self.alert_failures.load(Ordering::Relaxed),
            notifications_sent: self.notifications_sent.load(Ordering::Relaxed),
            notifications_suppressed: self.notifications_suppressed.load(Ordering::Relaxed),
            notification_failures: self.notification_failures.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of dispatch metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchMetricsSnapshot {
    pub events_tracked: u64,
    pub severity_anomalies: u64,
    pub pending: usize,
    pub records_enqueued: u64,
    pub records_queue_dropped: u64,
    pub batches_flushed: u64,
    pub batch_failures: u64,
    pub records_persisted: u64,
    pub records_lost: u64,
    pub alerts_sent: u64,
    pub alerts_sampled_out: u64,
    pub alert_failures: u64,
    pub notifications_sent: u64,
    pub notifications_suppressed: u64,
    pub notification_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flush_accounting() {
        let metrics = DispatchMetrics::new();
        metrics.record_flush(10, 1.0, true);
        metrics.record_flush(3, 1.0, false);

        let snap = metrics.snapshot();
        assert_eq!(snap.batches_flushed, 1);
        assert_eq!(snap.records_persisted, 10);
        assert_eq!(snap.batch_failures, 1);
        assert_eq!(snap.records_lost, 3);
    }

    #[test]
    fn test_outcome_counters() {
        let metrics = DispatchMetrics::new();
        metrics.record_alert(AlertOutcome::Sent);
        metrics.record_alert(AlertOutcome::SampledOut);
        metrics.record_alert(AlertOutcome::SampledOut);
        metrics.record_notification(NotifyOutcome::Suppressed);

        let snap = metrics.snapshot();
        assert_eq!(snap.alerts_sent, 1);
        assert_eq!(snap.alerts_sampled_out, 2);
        assert_eq!(snap.notifications_suppressed, 1);
        assert_eq!(snap.notifications_sent, 0);
    }
}
