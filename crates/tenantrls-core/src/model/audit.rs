//! Append-only audit records of evaluated access decisions.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::context::TenantSecurityContext;
use crate::model::evaluation::AccessEvaluationResult;
use crate::model::operation::{Operation, OperationType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditOperation {
    #[serde(rename = "type")]
    pub op_type: OperationType,
    pub table_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditSecurityContext {
    pub ip_address: String,
    pub user_agent: String,
    pub role: String,
    pub permissions: BTreeSet<String>,
    pub policies_applied: Vec<String>,
    pub rules_evaluated: Vec<String>,
    pub tenant_isolation: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditResult {
    pub allowed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_returned: Option<u64>,
    pub execution_time: f64,
    pub policies_matched: usize,
    pub rules_matched: usize,
    pub tenant_isolation_enforced: bool,
}

/// Audit input: a record without its generated id and timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAuditLog {
    pub organization_id: String,
    pub tenant_id: String,
    pub user_id: String,
    pub session_id: String,
    pub operation: AuditOperation,
    pub security_context: AuditSecurityContext,
    pub result: AuditResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl NewAuditLog {
    /// Record for one evaluation of `op` on behalf of `ctx`.
    pub fn from_evaluation(
        ctx: &TenantSecurityContext,
        op: &Operation,
        result: &AccessEvaluationResult,
        request_id: Option<String>,
    ) -> Self {
        Self {
            organization_id: ctx.organization_id.clone(),
            tenant_id: ctx.tenant_id.clone(),
            user_id: ctx.user_id.clone(),
            session_id: ctx.session_id.clone(),
            operation: AuditOperation {
                op_type: op.op_type,
                table_name: op.table_name.clone(),
                record_id: op.record_id.clone(),
                columns: op.columns.clone(),
                tenant_id: op.target_tenant_id.clone(),
            },
            security_context: AuditSecurityContext {
                ip_address: ctx.ip_address.clone(),
                user_agent: ctx.user_agent.clone(),
                role: ctx.role.clone(),
                permissions: ctx.permissions.clone(),
                policies_applied: result.policies_applied.clone(),
                rules_evaluated: result.rules_evaluated.clone(),
                tenant_isolation: result.tenant_isolation_enforced,
            },
            result: AuditResult {
                allowed: result.allowed,
                reason: Some(result.reason.clone()),
                data_returned: None,
                execution_time: result.execution_time,
                policies_matched: result.policies_applied.len(),
                rules_matched: result.rules_evaluated.len(),
                tenant_isolation_enforced: result.tenant_isolation_enforced,
            },
            request_id,
        }
    }
}

/// Immutable once written; never updated or deleted by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantAuditLog {
    pub id: String,
    pub organization_id: String,
    pub tenant_id: String,
    pub user_id: String,
    pub session_id: String,
    pub operation: AuditOperation,
    pub security_context: AuditSecurityContext,
    pub result: AuditResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl TenantAuditLog {
    pub fn from_new(id: String, new: NewAuditLog, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            organization_id: new.organization_id,
            tenant_id: new.tenant_id,
            user_id: new.user_id,
            session_id: new.session_id,
            operation: new.operation,
            security_context: new.security_context,
            result: new.result,
            request_id: new.request_id,
            timestamp,
        }
    }

    /// Denied under enforced tenant isolation.
    pub fn is_isolation_violation(&self) -> bool {
        self.result.tenant_isolation_enforced && !self.result.allowed
    }
}
