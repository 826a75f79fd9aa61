//! BatchBuffer - groups log records and flushes them to the persistent sink
//!
//! A single worker task owns the pending sequence, the flush deadline and the
//! sink. Callers talk to it through a bounded channel, so the size check, the
//! swap and the timer re-arm are serialized without a lock, and `enqueue`
//! never waits on a write.

use std::sync::Arc;
use std::time::{Duration, Instant as StdInstant};

use contracts::{AlertSink, BatchConfig, LogRecord, PersistentLogSink, Severity};
use observability::{FlushStatsAggregator, FlushSummary};
use serde_json::json;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, instrument, warn};

use crate::error::DispatcherError;
use crate::metrics::{AlertOutcome, DispatchMetrics};

/// Buffer lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferState {
    /// No pending records, no timer
    Idle,
    /// Pending records present, timer armed
    Accumulating,
}

/// Point-in-time view of the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferSnapshot {
    pub state: BufferState,
    pub pending: usize,
}

/// What caused a flush
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlushTrigger {
    Size,
    Timer,
    Drain,
    Shutdown,
}

enum BufferCommand {
    Enqueue(LogRecord),
    Drain(oneshot::Sender<usize>),
    Snapshot(oneshot::Sender<BufferSnapshot>),
}

/// Handle to a running batch buffer worker
pub struct BufferHandle {
    /// Persistent sink name
    name: String,
    /// Channel to the worker
    tx: mpsc::Sender<BufferCommand>,
    /// Shared metrics
    metrics: Arc<DispatchMetrics>,
    /// Worker task handle
    worker_handle: JoinHandle<FlushSummary>,
}

impl BufferHandle {
    /// Spawn the worker task. Must be called inside a tokio runtime.
    ///
    /// `alert` receives the self-report when a batch write fails.
    pub fn spawn<S: PersistentLogSink + 'static>(
        sink: S,
        config: &BatchConfig,
        alert: Option<Arc<dyn AlertSink>>,
        metrics: Arc<DispatchMetrics>,
    ) -> Self {
        let name = sink.name().to_string();
        let capacity = config.queue_capacity.clamp(1, BatchConfig::MAX_QUEUE_CAPACITY);
        let (tx, rx) = mpsc::channel(capacity);

        let worker = BufferWorker {
            sink,
            name: name.clone(),
            pending: Vec::new(),
            deadline: None,
            batch_size: config.batch_size.clamp(1, BatchConfig::MAX_BATCH_SIZE),
            flush_interval: config.flush_interval(),
            alert,
            metrics: Arc::clone(&metrics),
            stats: FlushStatsAggregator::new(),
        };

        let worker_handle = tokio::spawn(worker.run(rx));

        Self {
            name,
            tx,
            metrics,
            worker_handle,
        }
    }

    /// Get sink name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue a record (non-blocking)
    ///
    /// Returns true if queued, false if the queue is full (record dropped)
    pub fn enqueue(&self, record: LogRecord) -> bool {
        match self.tx.try_send(BufferCommand::Enqueue(record)) {
            Ok(()) => {
                self.metrics.record_enqueued();
                true
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.metrics.record_queue_dropped();
                warn!(sink = %self.name, "Buffer queue full, record dropped");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!(sink = %self.name, "Buffer worker closed unexpectedly");
                false
            }
        }
    }

    /// Flush everything queued before this call and wait for the write
    ///
    /// Returns the number of records persisted (0 if the write failed).
    #[instrument(name = "buffer_drain", skip(self), fields(sink = %self.name))]
    pub async fn drain(&self) -> Result<usize, DispatcherError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send(BufferCommand::Drain(ack_tx))
            .await
            .map_err(|_| DispatcherError::BufferClosed(self.name.clone()))?;
        ack_rx
            .await
            .map_err(|_| DispatcherError::BufferClosed(self.name.clone()))
    }

    /// Current state, after every command queued before this call
    pub async fn snapshot(&self) -> Result<BufferSnapshot, DispatcherError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(BufferCommand::Snapshot(reply_tx))
            .await
            .map_err(|_| DispatcherError::BufferClosed(self.name.clone()))?;
        reply_rx
            .await
            .map_err(|_| DispatcherError::BufferClosed(self.name.clone()))
    }

    /// Stop the worker after a final flush
    #[instrument(name = "buffer_shutdown", skip(self), fields(sink = %self.name))]
    pub async fn shutdown(self) -> FlushSummary {
        // Drop sender to signal worker to stop
        drop(self.tx);
        match self.worker_handle.await {
            Ok(summary) => {
                debug!(sink = %self.name, "BufferHandle shutdown complete");
                summary
            }
            Err(e) => {
                error!(sink = %self.name, error = ?e, "Buffer worker panicked");
                FlushSummary::default()
            }
        }
    }
}

struct BufferWorker<S> {
    sink: S,
    name: String,
    pending: Vec<LogRecord>,
    /// Armed on the empty -> non-empty transition only
    deadline: Option<Instant>,
    batch_size: usize,
    flush_interval: Duration,
    alert: Option<Arc<dyn AlertSink>>,
    metrics: Arc<DispatchMetrics>,
    stats: FlushStatsAggregator,
}

impl<S: PersistentLogSink> BufferWorker<S> {
    async fn run(mut self, mut rx: mpsc::Receiver<BufferCommand>) -> FlushSummary {
        debug!(sink = %self.name, batch_size = self.batch_size, "Buffer worker started");

        loop {
            let command = match self.deadline {
                Some(deadline) => tokio::select! {
                    command = rx.recv() => command,
                    _ = sleep_until(deadline) => {
                        self.flush(FlushTrigger::Timer).await;
                        continue;
                    }
                },
                None => rx.recv().await,
            };

            let Some(command) = command else { break };
            match command {
                BufferCommand::Enqueue(record) => self.enqueue(record).await,
                BufferCommand::Drain(ack) => {
                    let written = self.flush(FlushTrigger::Drain).await;
                    let _ = ack.send(written);
                }
                BufferCommand::Snapshot(reply) => {
                    let _ = reply.send(self.snapshot());
                }
            }
        }

        // Cleanup
        self.flush(FlushTrigger::Shutdown).await;
        if let Err(e) = self.sink.close().await {
            error!(sink = %self.name, error = %e, "Close failed on shutdown");
        }

        let summary = self.stats.summary();
        info!(
            sink = %self.name,
            batches = summary.total_batches,
            written = summary.records_written,
            lost = summary.records_lost,
            "Buffer worker stopped"
        );
        summary
    }

    async fn enqueue(&mut self, record: LogRecord) {
        let was_empty = self.pending.is_empty();
        self.pending.push(record);

        if self.pending.len() >= self.batch_size {
            self.flush(FlushTrigger::Size).await;
        } else {
            if was_empty {
                self.deadline = Some(Instant::now() + self.flush_interval);
            }
            self.metrics.set_pending(self.pending.len());
        }
    }

    fn snapshot(&self) -> BufferSnapshot {
        let state = if self.pending.is_empty() {
            BufferState::Idle
        } else {
            BufferState::Accumulating
        };
        BufferSnapshot {
            state,
            pending: self.pending.len(),
        }
    }

    /// Swap the pending sequence out, then write it. Returns records written.
    async fn flush(&mut self, trigger: FlushTrigger) -> usize {
        self.deadline = None;
        if self.pending.is_empty() {
            return 0;
        }

        let batch = std::mem::take(&mut self.pending);
        self.metrics.set_pending(0);

        let started = StdInstant::now();
        let result = self.sink.write_batch(&batch).await;
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

        self.metrics.record_flush(batch.len(), latency_ms, result.is_ok());
        self.stats.update(batch.len(), latency_ms, result.is_ok());

        match result {
            Ok(()) => {
                debug!(
                    sink = %self.name,
                    ?trigger,
                    records = batch.len(),
                    latency_ms,
                    "Batch flushed"
                );
                batch.len()
            }
            Err(e) => {
                self.report_failure(&e, batch.len(), trigger);
                0
            }
        }
    }

    /// One critical self-report per failed batch; the batch is not retried.
    fn report_failure(&self, err: &contracts::ContractError, dropped: usize, trigger: FlushTrigger) {
        let message = format!(
            "persistent log sink '{}' failed, {} records dropped: {}",
            self.name, dropped, err
        );
        error!(sink = %self.name, ?trigger, dropped, error = %err, "Batch write failed");

        let Some(alert) = &self.alert else {
            warn!(sink = %self.name, "Alert sink disabled, persistence failure not reported");
            return;
        };

        let context = json!({
            "sink": self.name,
            "dropped_records": dropped,
            "trigger": format!("{trigger:?}"),
            "error": err.to_string(),
        });
        match alert.capture_message(&message, Severity::Critical, Some(&context)) {
            Ok(()) => self.metrics.record_alert(AlertOutcome::Sent),
            Err(e) => {
                self.metrics.record_alert(AlertOutcome::Failed);
                error!(
                    sink = %self.name,
                    alert_sink = %alert.name(),
                    error = %e,
                    "Failed to report persistence failure: {message}"
                );
            }
        }
    }
}
