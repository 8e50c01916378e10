use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use bytes::Bytes;
use serde::Deserialize;

use tenantrls_core::error::Result;
use tenantrls_core::model::{NewTenantRule, TenantScope};

use crate::app_state::AppState;
use crate::policy::RuleFilter;

use super::body::{decode, parse_json, require};
use super::envelope::{created, ok};
use super::error::ApiResult;
use super::policies::{parse_flag, parse_limit};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleQuery {
    pub is_active: Option<String>,
    pub role: Option<String>,
    pub tenant_scope: Option<String>,
    pub limit: Option<String>,
}

impl RuleQuery {
    pub fn into_filter(self) -> Result<RuleFilter> {
        Ok(RuleFilter {
            is_active: parse_flag("isActive", self.is_active)?,
            role: self.role.filter(|s| !s.is_empty()),
            tenant_scope: self
                .tenant_scope
                .filter(|s| !s.is_empty())
                .map(|s| s.parse::<TenantScope>())
                .transpose()?,
            limit: parse_limit(self.limit)?,
        })
    }
}

pub async fn list_rules(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    Query(q): Query<RuleQuery>,
) -> ApiResult<impl IntoResponse> {
    let filter = q.into_filter()?;
    Ok(ok(state.store().tenant_rules(&tenant_id, &filter)))
}

pub async fn create_rule(State(state): State<AppState>, raw: Bytes) -> ApiResult<impl IntoResponse> {
    let body = parse_json(&raw)?;
    require(&body, &["tenantId", "ruleName"])?;
    let new: NewTenantRule = decode(body)?;

    let rule = state.store().create_rule(new)?;
    state.metrics().store_writes.inc(&[("kind", "rule")]);
    Ok(created(rule, "tenant rule created"))
}
