//! Axum router wiring.
//!
//! The policy API is nested under `gateway.base_path`; `/healthz` and
//! `/metrics` stay at the root. Data routes of a host application are
//! wrapped per table with [`guard_table`].

use axum::{middleware, routing::get, Router};

use crate::{api, app_state::AppState, middleware::request_log, middleware::tenant_guard, ops};

pub fn build_router(state: AppState) -> Router {
    let base = state.cfg().gateway.base_path.clone();

    Router::new()
        .nest(&base, api::routes())
        .route("/healthz", get(ops::healthz))
        .route("/metrics", get(ops::metrics))
        .layer(middleware::from_fn(request_log::logging))
        .with_state(state)
}

/// Put every route of `routes` behind the tenant guard for `table`.
///
/// The `tenantrls` binary serves only the policy API; host applications
/// mount their data routes through this, keyed by `tables` in the config.
pub fn guard_table<S>(routes: Router<S>, state: &AppState, table: &str) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    routes.layer(middleware::from_fn_with_state(
        tenant_guard::TableGuard::for_table(state, table),
        tenant_guard::tenant_guard,
    ))
}
