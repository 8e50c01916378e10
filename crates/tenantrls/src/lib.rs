//! Top-level facade crate for tenantrls.
//!
//! Re-exports the data model and the policy engine host so users can depend on a single crate.

pub mod core {
    pub use tenantrls_core::*;
}

pub mod gateway {
    pub use tenantrls_gateway::*;
}
