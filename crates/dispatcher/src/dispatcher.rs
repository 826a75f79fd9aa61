//! TelemetryDispatcher - classifies events and fans them out to sinks

use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use contracts::{
    AlertSink, BatchConfig, FeatureToggles, LogRecord, Notification, NotificationSink, RawEvent,
    PersistentLogSink, RoutingDecision, RoutingRules, Severity, SinkConfig, SinkRole, SinkType, TelemetryConfig,
    TelemetryEvent,
};
use observability::FlushSummary;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tracing::{debug, error, info, instrument, warn};

use crate::buffer::{BufferHandle, BufferSnapshot};
use crate::classifier::classify;
use crate::error::DispatcherError;
use crate::metrics::{AlertOutcome, DispatchMetrics, DispatchMetricsSnapshot, NotifyOutcome};
use crate::preferences::PreferenceHandle;
use crate::sampler::Sampler;
use crate::sinks::{FileSink, LogSink, NetworkSink};

/// Category used by the dispatcher's own reports
pub const SELF_REPORT_CATEGORY: &str = "TELEMETRY";

type SpawnBuffer =
    Box<dyn FnOnce(&BatchConfig, Option<Arc<dyn AlertSink>>, Arc<DispatchMetrics>) -> BufferHandle + Send>;

/// Kinds of input anomaly reported at most once per dispatcher instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum AnomalyKind {
    UnknownSeverity,
}

/// Builder for creating a TelemetryDispatcher
pub struct DispatcherBuilder {
    config: TelemetryConfig,
    persist: Option<SpawnBuffer>,
    alert: Option<Arc<dyn AlertSink>>,
    notify: Option<Arc<dyn NotificationSink>>,
    preferences: PreferenceHandle,
    sampler: Option<Sampler>,
}

impl DispatcherBuilder {
    /// Create a new DispatcherBuilder with no sinks attached
    pub fn new(config: TelemetryConfig) -> Self {
        Self {
            config,
            persist: None,
            alert: None,
            notify: None,
            preferences: PreferenceHandle::default(),
            sampler: None,
        }
    }

    /// Attach the persistent log sink; its buffer worker starts at `build`
    pub fn persistent_sink<S: PersistentLogSink + 'static>(mut self, sink: S) -> Self {
        self.persist = Some(Box::new(
            move |config: &BatchConfig,
                  alert: Option<Arc<dyn AlertSink>>,
                  metrics: Arc<DispatchMetrics>| {
                BufferHandle::spawn(sink, config, alert, metrics)
            },
        ));
        self
    }

    /// Attach the alert sink
    pub fn alert_sink(mut self, sink: Arc<dyn AlertSink>) -> Self {
        self.alert = Some(sink);
        self
    }

    /// Attach the notification sink
    pub fn notification_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.notify = Some(sink);
        self
    }

    /// Share externally owned notification preferences
    pub fn preferences(mut self, preferences: PreferenceHandle) -> Self {
        self.preferences = preferences;
        self
    }

    /// Replace the OS-seeded sampler (deterministic tests)
    pub fn sampler(mut self, sampler: Sampler) -> Self {
        self.sampler = Some(sampler);
        self
    }

    /// Build the dispatcher and start the buffer worker
    ///
    /// # Errors
    /// - sample rate outside [0, 1]
    /// - persistent sink attached outside a tokio runtime
    #[instrument(name = "dispatcher_builder_build", skip(self))]
    pub fn build(self) -> Result<TelemetryDispatcher, DispatcherError> {
        let TelemetryConfig {
            routing,
            batch,
            features,
            ..
        } = self.config;

        let rate = routing.alert_sample_rate;
        if !(0.0..=1.0).contains(&rate) {
            return Err(DispatcherError::InvalidRules(format!(
                "alert_sample_rate must be within [0, 1], got {rate}"
            )));
        }

        let sampler = self.sampler.unwrap_or_else(|| Sampler::new(rate));
        let metrics = Arc::new(DispatchMetrics::new());
        let alert = self.alert.filter(|_| features.enable_alert_sink);

        let buffer = match self.persist.filter(|_| features.enable_persistent_sink) {
            Some(spawn) => {
                tokio::runtime::Handle::try_current().map_err(|_| DispatcherError::NoRuntime)?;
                Some(spawn(&batch, alert.clone(), Arc::clone(&metrics)))
            }
            None => None,
        };

        info!(
            persist = buffer.as_ref().map(|b| b.name()),
            alert = alert.as_ref().map(|a| a.name()),
            notify = self.notify.as_ref().map(|n| n.name()),
            batch_size = batch.batch_size,
            flush_interval_ms = batch.flush_interval_ms,
            sample_rate = sampler.rate(),
            "Telemetry dispatcher started"
        );

        Ok(TelemetryDispatcher {
            sampler,
            rules: routing,
            features,
            buffer,
            alert,
            notify: self.notify,
            preferences: self.preferences,
            clock: MonotonicClock::default(),
            reported_anomalies: Mutex::new(HashSet::new()),
            metrics,
        })
    }
}

/// Create a dispatcher whose sinks come from the configured bindings
#[instrument(name = "dispatcher_create", skip(config, preferences))]
pub async fn create_dispatcher(
    config: TelemetryConfig,
    preferences: PreferenceHandle,
) -> Result<TelemetryDispatcher, DispatcherError> {
    let bindings = config.sinks.clone();
    let mut builder = DispatcherBuilder::new(config).preferences(preferences);

    builder = match bindings.persist.sink_type {
        SinkType::Log => builder.persistent_sink(LogSink::new(&bindings.persist.name)),
        SinkType::File => {
            let sink = FileSink::from_params(&bindings.persist.name, &bindings.persist.params)
                .await
                .map_err(|e| DispatcherError::sink_creation(&bindings.persist.name, e.to_string()))?;
            builder.persistent_sink(sink)
        }
        SinkType::Network => return Err(unsupported(SinkRole::Persist, &bindings.persist)),
    };

    builder = builder.alert_sink(create_alert_sink(&bindings.alert).await?);
    builder = builder.notification_sink(create_notification_sink(&bindings.notify).await?);
    builder.build()
}

fn unsupported(role: SinkRole, config: &SinkConfig) -> DispatcherError {
    DispatcherError::UnsupportedSink {
        name: config.name.clone(),
        role,
        sink_type: config.sink_type,
    }
}

/// Create an alert sink from configuration
#[instrument(
    name = "dispatcher_create_alert_sink",
    skip(config),
    fields(sink = %config.name, sink_type = ?config.sink_type)
)]
async fn create_alert_sink(config: &SinkConfig) -> Result<Arc<dyn AlertSink>, DispatcherError> {
    match config.sink_type {
        SinkType::Log => Ok(Arc::new(LogSink::new(&config.name))),
        SinkType::Network => {
            let sink = NetworkSink::from_params(&config.name, &config.params)
                .await
                .map_err(|e| DispatcherError::sink_creation(&config.name, e.to_string()))?;
            Ok(Arc::new(sink))
        }
        SinkType::File => Err(unsupported(SinkRole::Alert, config)),
    }
}

/// Create a notification sink from configuration
#[instrument(
    name = "dispatcher_create_notification_sink",
    skip(config),
    fields(sink = %config.name, sink_type = ?config.sink_type)
)]
async fn create_notification_sink(
    config: &SinkConfig,
) -> Result<Arc<dyn NotificationSink>, DispatcherError> {
    match config.sink_type {
        SinkType::Log => Ok(Arc::new(LogSink::new(&config.name))),
        SinkType::Network => {
            let sink = NetworkSink::from_params(&config.name, &config.params)
                .await
                .map_err(|e| DispatcherError::sink_creation(&config.name, e.to_string()))?;
            Ok(Arc::new(sink))
        }
        SinkType::File => Err(unsupported(SinkRole::Notify, config)),
    }
}

/// Non-decreasing UTC timestamps at microsecond resolution
#[derive(Debug, Default)]
struct MonotonicClock {
    /// High-water mark, microseconds since epoch
    last_micros: AtomicI64,
}

impl MonotonicClock {
    fn now(&self) -> DateTime<Utc> {
        self.now_from(Utc::now())
    }

    /// Stamp from a wall-clock reading; never earlier than a previous stamp
    fn now_from(&self, wall: DateTime<Utc>) -> DateTime<Utc> {
        let micros = wall.timestamp_micros();
        let previous = self.last_micros.fetch_max(micros, Ordering::AcqRel);
        DateTime::from_timestamp_micros(previous.max(micros)).unwrap_or(wall)
    }
}

/// What `shutdown` leaves behind
#[derive(Debug, Clone)]
pub struct ShutdownReport {
    pub metrics: DispatchMetricsSnapshot,
    /// None when persistence was disabled
    pub flush: Option<FlushSummary>,
}

/// Process-wide telemetry façade
///
/// `Send + Sync`; share it behind an `Arc`. `track` and friends never fail
/// and never wait on a sink.
pub struct TelemetryDispatcher {
    rules: RoutingRules,
    features: FeatureToggles,
    sampler: Sampler,
    buffer: Option<BufferHandle>,
    alert: Option<Arc<dyn AlertSink>>,
    notify: Option<Arc<dyn NotificationSink>>,
    preferences: PreferenceHandle,
    clock: MonotonicClock,
    /// Anomaly kinds already self-reported. Scoped to this instance, not the
    /// process: a dispatcher rebuilt on config reload reports each kind again.
    reported_anomalies: Mutex<HashSet<AnomalyKind>>,
    metrics: Arc<DispatchMetrics>,
}

impl TelemetryDispatcher {
    /// Routing rules in effect
    pub fn rules(&self) -> &RoutingRules {
        &self.rules
    }

    /// Alert sample rate in effect
    pub fn sample_rate(&self) -> f64 {
        self.sampler.rate()
    }

    /// Handle to the live notification preferences
    pub fn preferences(&self) -> &PreferenceHandle {
        &self.preferences
    }

    /// Routing decision after masking sinks that are absent or disabled
    pub fn route(&self, severity: Severity) -> RoutingDecision {
        let decision = classify(severity, &self.rules);
        RoutingDecision {
            persist: decision.persist && self.buffer.is_some(),
            alert: decision.alert && self.alert.is_some(),
            notify: decision.notify && self.notify.is_some(),
        }
    }

    /// Stamp, classify and fan out one event
    pub fn track(&self, event: TelemetryEvent) {
        let timestamp = self.clock.now();
        let decision = self.route(event.severity);
        self.metrics.record_tracked(event.severity);

        if self.features.enable_console_echo {
            echo(&event);
        }
        if decision.alert {
            self.forward_alert(&event);
        }
        if decision.notify {
            self.forward_notification(&event);
        }
        if decision.persist {
            if let Some(buffer) = &self.buffer {
                buffer.enqueue(LogRecord::from_event(event, timestamp));
            }
        }
    }

    /// Resolve an untrusted severity tag, then `track`
    ///
    /// Unknown tags route as `info`.
    pub fn track_raw(&self, raw: RawEvent) {
        let severity = match raw.severity.parse::<Severity>() {
            Ok(severity) => severity,
            Err(e) => {
                self.report_anomaly(AnomalyKind::UnknownSeverity, &raw.severity, &e);
                Severity::Info
            }
        };
        self.track(raw.into_event(severity));
    }

    /// Track a caught error as a `critical` event
    pub fn log_error<E>(&self, error: &E, context: Option<Value>)
    where
        E: std::error::Error + ?Sized,
    {
        let mut message = error.to_string();
        let mut source = error.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }

        let type_name = std::any::type_name::<E>();
        let action = type_name.rsplit("::").next().unwrap_or(type_name);

        let mut event = TelemetryEvent::new("ERROR", action, message, Severity::Critical);
        event.context = context;
        self.track(event);
    }

    /// Track a user/system activity as an `info` event
    pub fn log_activity(&self, action: impl Into<String>, message: impl Into<String>) {
        self.track(TelemetryEvent::new(
            "ACTIVITY",
            action,
            message,
            Severity::Info,
        ));
    }

    /// Flush pending records and wait for the write
    ///
    /// Returns the number of records persisted.
    pub async fn drain(&self) -> Result<usize, DispatcherError> {
        match &self.buffer {
            Some(buffer) => buffer.drain().await,
            None => Ok(0),
        }
    }

    /// Buffer state, None when persistence is disabled
    pub async fn buffer_snapshot(&self) -> Result<Option<BufferSnapshot>, DispatcherError> {
        match &self.buffer {
            Some(buffer) => buffer.snapshot().await.map(Some),
            None => Ok(None),
        }
    }

    /// Current counters
    pub fn metrics(&self) -> DispatchMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Final flush and stop the buffer worker
    #[instrument(name = "dispatcher_shutdown", skip(self))]
    pub async fn shutdown(self) -> ShutdownReport {
        let flush = match self.buffer {
            Some(buffer) => Some(buffer.shutdown().await),
            None => None,
        };
        let metrics = self.metrics.snapshot();
        info!(
            tracked = metrics.events_tracked,
            persisted = metrics.records_persisted,
            alerts = metrics.alerts_sent,
            notifications = metrics.notifications_sent,
            "Telemetry dispatcher shutdown complete"
        );
        ShutdownReport { metrics, flush }
    }

    fn forward_alert(&self, event: &TelemetryEvent) {
        let Some(alert) = &self.alert else { return };

        if !self.sampler.should_forward(event.severity) {
            self.metrics.record_alert(AlertOutcome::SampledOut);
            debug!(category = %event.category, severity = %event.severity, "Alert sampled out");
            return;
        }

        match alert.capture_message(&event.message, event.severity, event.context.as_ref()) {
            Ok(()) => self.metrics.record_alert(AlertOutcome::Sent),
            Err(e) => {
                self.metrics.record_alert(AlertOutcome::Failed);
                warn!(
                    sink = %alert.name(),
                    category = %event.category,
                    error = %e,
                    "Alert sink failed: {}",
                    event.message
                );
            }
        }
    }

    fn forward_notification(&self, event: &TelemetryEvent) {
        let Some(notify) = &self.notify else { return };

        // Read live preferences; never cached
        let channels = self.preferences.read(|prefs| {
            prefs
                .permits(&event.category, event.severity)
                .then(|| prefs.channels())
        });
        let Some(channels) = channels else {
            self.metrics.record_notification(NotifyOutcome::Suppressed);
            debug!(category = %event.category, "Notification suppressed by preferences");
            return;
        };

        let notification = Notification {
            severity: event.severity,
            category: event.category.clone(),
            message: event.message.clone(),
            channels,
        };
        match notify.notify(&notification) {
            Ok(()) => self.metrics.record_notification(NotifyOutcome::Sent),
            Err(e) => {
                self.metrics.record_notification(NotifyOutcome::Failed);
                warn!(
                    sink = %notify.name(),
                    category = %event.category,
                    error = %e,
                    "Notification sink failed: {}",
                    event.message
                );
            }
        }
    }

    fn report_anomaly(&self, kind: AnomalyKind, tag: &str, err: &contracts::ContractError) {
        self.metrics.record_anomaly();
        let first = self.reported_anomalies.lock().insert(kind);
        if !first {
            debug!(?kind, tag, "Repeated severity anomaly, routed as info");
            return;
        }

        warn!(?kind, tag, error = %err, "Severity anomaly, routed as info");
        let event = TelemetryEvent::new(
            SELF_REPORT_CATEGORY,
            "severity_anomaly",
            format!("{err}; event routed as info"),
            Severity::Info,
        )
        .with_context(json!({ "tag": tag }));
        self.track(event);
    }
}

/// Console echo at a level matching the severity
fn echo(event: &TelemetryEvent) {
    match event.severity {
        Severity::Info | Severity::Success => info!(
            category = %event.category,
            action = %event.action,
            severity = %event.severity,
            "{}",
            event.message
        ),
        Severity::Warning => warn!(
            category = %event.category,
            action = %event.action,
            "{}",
            event.message
        ),
        Severity::Error | Severity::Critical => error!(
            category = %event.category,
            action = %event.action,
            severity = %event.severity,
            "{}",
            event.message
        ),
    }
}
