//! Per-table tenant guard.
//!
//! Builds the caller's security context from `x-*` headers, asks the
//! evaluator, and either answers 403 or forwards a sanitized request. On the
//! way back it strips foreign records from the response envelope and reports
//! the decision in `x-rls-*` headers.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use tenantrls_core::model::{AccessEvaluationResult, Operation, OperationType};

use crate::api::envelope::Envelope;
use crate::api::error::ApiError;
use crate::app_state::AppState;
use crate::config::TableConfig;
use crate::context::tenant::{context_from_headers, header as header_str, request_id, H_TARGET_TENANT_ID};

use super::sanitize::{filter_response, stamp_payload, FilterOutcome};

pub const H_POLICIES_APPLIED: &str = "x-rls-policies-applied";
pub const H_RULES_EVALUATED: &str = "x-rls-rules-evaluated";
pub const H_TENANT_ISOLATION: &str = "x-rls-tenant-isolation";

const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Middleware state: the shared app plus the guarded table's switches.
#[derive(Clone)]
pub struct TableGuard {
    state: AppState,
    table: Arc<TableConfig>,
}

impl TableGuard {
    pub fn new(state: AppState, table: TableConfig) -> Self {
        Self {
            state,
            table: Arc::new(table),
        }
    }

    /// Guard for `name`, using its configured switches or the defaults.
    pub fn for_table(state: &AppState, name: &str) -> Self {
        let table = state
            .cfg()
            .table(name)
            .cloned()
            .unwrap_or_else(|| TableConfig::new(name));
        Self::new(state.clone(), table)
    }

    pub fn table(&self) -> &TableConfig {
        &self.table
    }
}

pub fn operation_for(method: &Method) -> Option<OperationType> {
    match *method {
        Method::GET | Method::HEAD => Some(OperationType::Select),
        Method::POST => Some(OperationType::Insert),
        Method::PUT | Method::PATCH => Some(OperationType::Update),
        Method::DELETE => Some(OperationType::Delete),
        _ => None,
    }
}

pub async fn tenant_guard(State(guard): State<TableGuard>, req: Request, next: Next) -> Response {
    let state = &guard.state;
    let table = guard.table();

    let Some(op_type) = operation_for(req.method()) else {
        state.metrics().middleware_rejections.inc(&[("reason", "method")]);
        let body = Envelope::failure(format!("method {} not supported", req.method()), None, None);
        return (StatusCode::METHOD_NOT_ALLOWED, Json(body)).into_response();
    };

    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip());
    let ctx = match context_from_headers(req.headers(), peer) {
        Ok(ctx) => ctx,
        Err(e) => {
            state.metrics().middleware_rejections.inc(&[("reason", "context")]);
            return ApiError(e).into_response();
        }
    };

    let mut op = Operation::new(op_type, table.name.clone());
    if let Some(target) = header_str(req.headers(), H_TARGET_TENANT_ID) {
        op = op.with_target_tenant(target);
    }

    let ctx = state.contexts().create_context(ctx);
    let (result, _) = state.evaluate_and_audit(&ctx, &op, Some(request_id(req.headers())));

    if !result.allowed {
        state.metrics().middleware_rejections.inc(&[("reason", "denied")]);
        tracing::info!(
            tenant_id = %ctx.tenant_id,
            user_id = %ctx.user_id,
            table = %table.name,
            op = %op_type,
            reason = %result.reason,
            "request denied by tenant guard"
        );
        let body = Envelope::failure(
            "access denied",
            Some(result.reason.clone()),
            Some(json!({
                "policiesApplied": result.policies_applied,
                "rulesEvaluated": result.rules_evaluated,
                "tenantIsolationEnforced": result.tenant_isolation_enforced,
            })),
        );
        let mut resp = (StatusCode::FORBIDDEN, Json(body)).into_response();
        decision_headers(resp.headers_mut(), &result);
        return resp;
    }

    // inbound: stamp identity onto JSON payloads
    let (mut parts, body) = req.into_parts();
    let body = if matches!(op_type, OperationType::Insert | OperationType::Update)
        && (table.stamp_tenant || table.stamp_created_by)
        && is_json(&parts.headers)
    {
        let raw = match to_bytes(body, MAX_BODY_BYTES).await {
            Ok(b) => b,
            Err(_) => {
                let body = Envelope::failure("request body too large or unreadable", None, None);
                return (StatusCode::PAYLOAD_TOO_LARGE, Json(body)).into_response();
            }
        };
        match serde_json::from_slice::<Value>(&raw) {
            Ok(mut v) => {
                stamp_payload(&mut v, &ctx, table, op_type);
                parts.headers.remove(header::CONTENT_LENGTH);
                Body::from(v.to_string())
            }
            Err(_) => Body::from(raw),
        }
    } else {
        body
    };

    let mut req = Request::from_parts(parts, body);
    req.extensions_mut().insert(ctx.clone());

    let resp = next.run(req).await;

    // outbound: drop records of other tenants
    let mut resp = if table.filter_responses && resp.status().is_success() && is_json(resp.headers()) {
        let (mut parts, body) = resp.into_parts();
        match to_bytes(body, usize::MAX).await {
            Ok(raw) => match serde_json::from_slice::<Value>(&raw) {
                Ok(mut v) => match filter_response(&mut v, &ctx) {
                    FilterOutcome::Blocked => {
                        state.metrics().middleware_rejections.inc(&[("reason", "foreign_record")]);
                        tracing::warn!(
                            tenant_id = %ctx.tenant_id,
                            table = %table.name,
                            "response blocked: record of another tenant"
                        );
                        let body = Envelope::failure(
                            "access denied",
                            Some("record belongs to another tenant".into()),
                            None,
                        );
                        (StatusCode::FORBIDDEN, Json(body)).into_response()
                    }
                    FilterOutcome::Stripped(n) => {
                        tracing::debug!(tenant_id = %ctx.tenant_id, table = %table.name, stripped = n, "foreign records removed");
                        parts.headers.remove(header::CONTENT_LENGTH);
                        Response::from_parts(parts, Body::from(v.to_string()))
                    }
                    FilterOutcome::Untouched => Response::from_parts(parts, Body::from(raw)),
                },
                Err(_) => Response::from_parts(parts, Body::from(raw)),
            },
            Err(e) => {
                tracing::error!(error = %e, table = %table.name, "failed to read response body");
                let body = Envelope::failure("internal server error", None, None);
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    } else {
        resp
    };

    decision_headers(resp.headers_mut(), &result);
    resp
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"))
}

fn decision_headers(headers: &mut HeaderMap, result: &AccessEvaluationResult) {
    let pairs = [
        (H_POLICIES_APPLIED, result.policies_applied.join(",")),
        (H_RULES_EVALUATED, result.rules_evaluated.join(",")),
        (H_TENANT_ISOLATION, result.tenant_isolation_enforced.to_string()),
    ];
    for (name, value) in pairs {
        if let Ok(v) = HeaderValue::from_str(&value) {
            headers.insert(name, v);
        }
    }
}
