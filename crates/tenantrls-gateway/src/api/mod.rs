//! Policy engine HTTP API.
//!
//! Every handler answers with the [`envelope::Envelope`] shape; failures go
//! through [`error::ApiError`].

pub mod body;
pub mod contexts;
pub mod envelope;
pub mod error;
pub mod evaluate;
pub mod generate;
pub mod health;
pub mod policies;
pub mod rules;
pub mod stats;

use axum::{
    routing::{get, post},
    Router,
};

use crate::app_state::AppState;

/// Routes relative to the configured base path.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/policies", post(policies::create_policy))
        .route("/policies/:tenant_id", get(policies::list_policies))
        .route("/policies/:tenant_id/:policy_id", get(policies::get_policy))
        .route("/rules", post(rules::create_rule))
        .route("/rules/:tenant_id", get(rules::list_rules))
        .route("/evaluate-access", post(evaluate::evaluate_access))
        .route("/contexts", post(contexts::create_context))
        .route("/contexts/:session_id", get(contexts::get_context))
        .route("/stats/:tenant_id", get(stats::get_stats))
        .route("/generate-policy", post(generate::generate_policy))
        .route("/health", get(health::health))
}
