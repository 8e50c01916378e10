use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use bytes::Bytes;
use serde::Deserialize;

use tenantrls_core::error::{Result, TenantRlsError};
use tenantrls_core::model::{NewTenantPolicy, PolicyOperation};

use crate::app_state::AppState;
use crate::policy::PolicyFilter;

use super::body::{decode, parse_json, require};
use super::envelope::{created, ok};
use super::error::ApiResult;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyQuery {
    pub table_name: Option<String>,
    pub operation: Option<String>,
    pub is_active: Option<String>,
    pub enforce_tenant_isolation: Option<String>,
    pub limit: Option<String>,
}

impl PolicyQuery {
    pub fn into_filter(self) -> Result<PolicyFilter> {
        Ok(PolicyFilter {
            table_name: self.table_name.filter(|s| !s.is_empty()),
            operation: self
                .operation
                .filter(|s| !s.is_empty())
                .map(|s| s.parse::<PolicyOperation>())
                .transpose()?,
            is_active: parse_flag("isActive", self.is_active)?,
            enforce_tenant_isolation: parse_flag("enforceTenantIsolation", self.enforce_tenant_isolation)?,
            limit: parse_limit(self.limit)?,
        })
    }
}

pub(crate) fn parse_flag(name: &str, raw: Option<String>) -> Result<Option<bool>> {
    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some("true") => Ok(Some(true)),
        Some("false") => Ok(Some(false)),
        Some(other) => Err(TenantRlsError::BadRequest(format!(
            "{name} must be true or false, got {other}"
        ))),
    }
}

pub(crate) fn parse_limit(raw: Option<String>) -> Result<Option<usize>> {
    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(|_| TenantRlsError::BadRequest(format!("limit must be a non-negative integer, got {s}"))),
    }
}

pub async fn list_policies(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    Query(q): Query<PolicyQuery>,
) -> ApiResult<impl IntoResponse> {
    let filter = q.into_filter()?;
    Ok(ok(state.store().tenant_policies(&tenant_id, &filter)))
}

pub async fn create_policy(State(state): State<AppState>, raw: Bytes) -> ApiResult<impl IntoResponse> {
    let body = parse_json(&raw)?;
    require(&body, &["tenantId", "tableName", "policyName"])?;
    let new: NewTenantPolicy = decode(body)?;

    let policy = state.store().create_policy(new)?;
    state.metrics().store_writes.inc(&[("kind", "policy")]);
    Ok(created(policy, "tenant policy created"))
}

pub async fn get_policy(
    State(state): State<AppState>,
    Path((tenant_id, policy_id)): Path<(String, String)>,
) -> ApiResult<impl IntoResponse> {
    let policy = state
        .store()
        .policy(&tenant_id, &policy_id)
        .ok_or_else(|| TenantRlsError::NotFound(format!("tenant policy {policy_id}")))?;
    Ok(ok(policy))
}
