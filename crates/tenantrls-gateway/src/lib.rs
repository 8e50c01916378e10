//! Tenant RLS gateway library entry.
//!
//! Hosts the policy store, access evaluator, context registry and audit log
//! behind an axum HTTP API, plus the tenant guard middleware for data routes.
//! Consumed by the binary (`main.rs`) and by integration tests.

pub mod api;
pub mod app_state;
pub mod audit;
pub mod config;
pub mod context;
pub mod id;
pub mod middleware;
pub mod obs;
pub mod ops;
pub mod policy;
pub mod router;
