use axum::{extract::State, http::HeaderMap, response::IntoResponse};
use bytes::Bytes;
use serde::Deserialize;

use tenantrls_core::model::{Operation, TenantSecurityContext};

use crate::app_state::AppState;
use crate::context::tenant::{header, H_REQUEST_ID};

use super::body::{decode, parse_json, require};
use super::envelope::ok;
use super::error::ApiResult;

#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    pub context: TenantSecurityContext,
    pub operation: Operation,
}

/// Evaluate, then audit; the audit record mirrors the returned decision.
pub async fn evaluate_access(
    State(state): State<AppState>,
    headers: HeaderMap,
    raw: Bytes,
) -> ApiResult<impl IntoResponse> {
    let body = parse_json(&raw)?;
    require(
        &body,
        &["context.tenantId", "context.userId", "operation.type", "operation.tableName"],
    )?;
    let req: EvaluateRequest = decode(body)?;

    let request_id = header(&headers, H_REQUEST_ID).map(str::to_string);
    let (result, _) = state.evaluate_and_audit(&req.context, &req.operation, request_id);
    Ok(ok(result))
}
