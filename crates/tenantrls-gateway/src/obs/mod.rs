//! Lightweight in-process metrics, rendered in Prometheus text format by the
//! `/metrics` handler.

pub mod metrics;

pub use metrics::EngineMetrics;
