//! # Contracts
//!
//! Frozen interface contracts, defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Events carry no caller timestamp; the dispatcher stamps `LogRecord::timestamp`
//!   (UTC, microsecond resolution) at ingestion
//! - Stamps are non-decreasing per dispatcher instance

mod config;
mod error;
mod event;
mod preferences;
mod routing;
mod severity;
mod sink;

pub use config::*;
pub use error::*;
pub use event::*;
pub use preferences::*;
pub use routing::*;
pub use severity::Severity;
pub use sink::*;
