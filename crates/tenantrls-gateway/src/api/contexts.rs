use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use bytes::Bytes;

use tenantrls_core::error::TenantRlsError;
use tenantrls_core::model::TenantSecurityContext;

use crate::app_state::AppState;

use super::body::{decode, parse_json, require};
use super::envelope::{created, ok};
use super::error::ApiResult;

pub async fn create_context(State(state): State<AppState>, raw: Bytes) -> ApiResult<impl IntoResponse> {
    let body = parse_json(&raw)?;
    require(&body, &["tenantId", "userId", "organizationId"])?;
    let ctx: TenantSecurityContext = decode(body)?;

    let stored = state.contexts().create_context(ctx);
    state.metrics().store_writes.inc(&[("kind", "context")]);
    Ok(created(stored, "tenant context created"))
}

pub async fn get_context(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let ctx = state
        .contexts()
        .get_context(&session_id)
        .ok_or_else(|| TenantRlsError::NotFound(format!("tenant context {session_id}")))?;
    Ok(ok(ctx))
}
