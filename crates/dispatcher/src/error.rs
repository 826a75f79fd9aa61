//! Dispatcher error types

use contracts::{SinkRole, SinkType};
use thiserror::Error;

/// Dispatcher-specific errors
///
/// Only construction and lifecycle calls return these; `track` never fails.
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Sink creation error
    #[error("failed to create sink '{name}': {message}")]
    SinkCreation { name: String, message: String },

    /// Sink type bound to a role it cannot serve
    #[error("sink '{name}' of type {sink_type:?} cannot serve the {role} role")]
    UnsupportedSink {
        name: String,
        role: SinkRole,
        sink_type: SinkType,
    },

    /// Routing rules rejected at construction
    #[error("invalid routing rules: {0}")]
    InvalidRules(String),

    /// Batch buffer requires a running tokio runtime
    #[error("batch buffer requires a tokio runtime")]
    NoRuntime,

    /// Batch buffer worker is gone
    #[error("batch buffer worker for sink '{0}' has stopped")]
    BufferClosed(String),

    /// Sink error (from contract)
    #[error("sink error: {0}")]
    Contract(#[from] contracts::ContractError),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DispatcherError {
    /// Create a sink creation error
    pub fn sink_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkCreation {
            name: name.into(),
            message: message.into(),
        }
    }
}
