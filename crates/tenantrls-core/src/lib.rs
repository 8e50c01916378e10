//! tenantrls core: transport-agnostic data model and error types.
//!
//! This crate defines the records the policy engine reasons about
//! (security contexts, operations, tenant policies and rules, evaluation
//! results, audit records) together with the error surface shared by the
//! gateway. It carries no runtime or storage dependencies so the model can be
//! reused by other consumers of the decision API.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here.
//! All fallible paths must surface as `TenantRlsError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod model;

/// Shared result type.
pub use error::{Result, TenantRlsError};
