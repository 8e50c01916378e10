//! Policy layer: rule and policy storage, matching, evaluation, generation.
//!
//! The [`AccessEvaluator`] consults the shared [`PolicyStore`]; nothing else
//! decides access.

pub mod defaults;
pub mod engine;
pub mod generator;
pub mod matcher;
pub mod store;

pub use engine::AccessEvaluator;
pub use generator::{AccessLevel, PolicyRequirements};
pub use store::{PolicyFilter, PolicyStore, RuleFilter};
