use axum::{extract::State, response::IntoResponse};
use bytes::Bytes;
use serde::Deserialize;

use crate::app_state::AppState;
use crate::policy::generator::{generate_tenant_policy, PolicyRequirements};

use super::body::{decode, parse_json, require};
use super::envelope::created;
use super::error::ApiResult;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub tenant_id: String,
    pub table_name: String,
    pub requirements: PolicyRequirements,
}

pub async fn generate_policy(State(state): State<AppState>, raw: Bytes) -> ApiResult<impl IntoResponse> {
    let body = parse_json(&raw)?;
    require(
        &body,
        &[
            "tenantId",
            "tableName",
            "requirements.accessLevel",
            "requirements.operations",
            "requirements.roles",
        ],
    )?;
    let req: GenerateRequest = decode(body)?;

    let policy = generate_tenant_policy(state.store(), &req.tenant_id, &req.table_name, &req.requirements)?;
    state.metrics().store_writes.inc(&[("kind", "policy")]);
    Ok(created(policy, "tenant policy generated"))
}
