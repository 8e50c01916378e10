//! Security context construction and the per-session context registry.

pub mod registry;
pub mod tenant;

pub use registry::ContextRegistry;
pub use tenant::context_from_headers;
