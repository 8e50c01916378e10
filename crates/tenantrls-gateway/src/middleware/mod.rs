//! HTTP middleware: request logging and the per-table tenant guard.

pub mod request_log;
pub mod sanitize;
pub mod tenant_guard;

pub use tenant_guard::{tenant_guard, TableGuard};
