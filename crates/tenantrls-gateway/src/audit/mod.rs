//! Audit trail of evaluated access decisions and per-tenant statistics.

pub mod log;
pub mod stats;

pub use log::AuditLog;
pub use stats::tenant_stats;
