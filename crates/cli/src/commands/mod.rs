//! Command implementations.

mod emit;
mod info;
mod router;
mod run;
mod validate;

pub use emit::run_emit;
pub use info::run_info;
pub use run::run_router;
pub use validate::run_validate;
