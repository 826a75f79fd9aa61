//! # Dispatcher
//!
//! 遥测事件分发模块。
//!
//! 负责：
//! - 按 severity 分类事件（persist / alert / notify）
//! - 批量缓冲持久化日志，按大小或定时刷新
//! - 告警采样与通知偏好过滤
//! - 隔离慢 sink，不阻塞调用方

pub mod buffer;
pub mod classifier;
pub mod dispatcher;
pub mod error;
pub mod metrics;
pub mod preferences;
pub mod sampler;
pub mod sinks;

pub use buffer::{BufferHandle, BufferSnapshot, BufferState};
pub use classifier::{classify, routing_table};
pub use contracts::{RawEvent, Severity, TelemetryConfig, TelemetryEvent};
pub use dispatcher::{
    create_dispatcher, DispatcherBuilder, ShutdownReport, TelemetryDispatcher,
    SELF_REPORT_CATEGORY,
};
pub use error::DispatcherError;
pub use metrics::{AlertOutcome, DispatchMetrics, DispatchMetricsSnapshot, NotifyOutcome};
pub use preferences::PreferenceHandle;
pub use sampler::Sampler;
pub use sinks::{FileSink, LogSink, MemorySink, NetworkSink};
