//! Template-driven policy generation from high-level access requirements.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use tenantrls_core::error::Result;
use tenantrls_core::model::{
    AccessRules, ComplianceFlags, ConditionType, NewTenantPolicy, OperationType,
    PolicyConditions, PolicyConfiguration, PolicyMetadata, PolicyOperation, TenantConditions,
    TenantPolicy, TenantRestrictions,
};

use super::store::PolicyStore;

/// Organization placeholder resolved by the data layer at query time.
pub const CURRENT_ORGANIZATION: &str = "current_organization";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    TenantStrict,
    TenantShared,
    CrossTenant,
    AdminOnly,
}

impl AccessLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            AccessLevel::TenantStrict => "tenant_strict",
            AccessLevel::TenantShared => "tenant_shared",
            AccessLevel::CrossTenant => "cross_tenant",
            AccessLevel::AdminOnly => "admin_only",
        }
    }

    /// Descriptive filter expression; recorded, never executed.
    pub fn expression(self) -> &'static str {
        match self {
            AccessLevel::TenantStrict => "tenant_id = $1",
            AccessLevel::TenantShared => "tenant_id = $1 OR tenant_id IS NULL",
            AccessLevel::CrossTenant => "organization_id = $1",
            AccessLevel::AdminOnly => "tenant_id = $1 AND role = $2",
        }
    }

    fn priority(self) -> i32 {
        match self {
            AccessLevel::AdminOnly => 10,
            _ => 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRequirements {
    pub access_level: AccessLevel,
    pub operations: Vec<OperationType>,
    pub roles: Vec<String>,
    #[serde(default)]
    pub enforce_isolation: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_conditions: Option<String>,
}

/// Build the creation input for `table_name` under `tenant_id`.
pub fn build_policy(tenant_id: &str, table_name: &str, req: &PolicyRequirements) -> NewTenantPolicy {
    let level = req.access_level;

    let mut expression = level.expression().to_string();
    if let Some(extra) = req.additional_conditions.as_deref().filter(|s| !s.is_empty()) {
        expression.push_str(&format!(" AND ({extra})"));
    }

    let mut parameters = Map::new();
    match level {
        AccessLevel::TenantStrict | AccessLevel::TenantShared => {
            parameters.insert("tenantId".into(), Value::from(tenant_id));
        }
        AccessLevel::CrossTenant => {
            parameters.insert("organizationId".into(), Value::from(CURRENT_ORGANIZATION));
        }
        AccessLevel::AdminOnly => {
            parameters.insert("tenantId".into(), Value::from(tenant_id));
            parameters.insert("role".into(), Value::from("admin"));
        }
    }

    let operation = match req.operations.as_slice() {
        [single] => PolicyOperation::from(*single),
        _ => PolicyOperation::All,
    };

    let cross_ops = if level == AccessLevel::CrossTenant {
        req.operations.iter().map(|o| o.as_str().to_string()).collect()
    } else {
        Vec::new()
    };

    NewTenantPolicy {
        tenant_id: tenant_id.to_string(),
        organization_id: CURRENT_ORGANIZATION.into(),
        table_name: table_name.to_string(),
        policy_name: format!("{table_name}_{}_tenant_access", level.as_str()),
        description: Some(format!(
            "Auto-generated policy for {table_name} with access level {} in tenant {tenant_id}",
            level.as_str()
        )),
        configuration: PolicyConfiguration {
            operation,
            is_active: true,
            priority: level.priority(),
            bypass_rls: false,
            enforce_tenant_isolation: req.enforce_isolation,
        },
        conditions: PolicyConditions {
            condition_type: if req.enforce_isolation {
                ConditionType::TenantIsolation
            } else {
                ConditionType::RoleBased
            },
            expression,
            parameters,
            tenant_conditions: Some(TenantConditions {
                strict_isolation: req.enforce_isolation,
                cross_tenant_access: level == AccessLevel::CrossTenant,
                shared_data_access: level == AccessLevel::TenantShared,
            }),
        },
        access_rules: AccessRules {
            roles: Some(req.roles.clone()),
            tenant_restrictions: Some(TenantRestrictions {
                allowed_tenants: req.enforce_isolation.then(|| vec![tenant_id.to_string()]),
                blocked_tenants: None,
                cross_tenant_operations: Some(cross_ops),
            }),
            time_restrictions: None,
            ip_restrictions: None,
        },
        metadata: PolicyMetadata {
            tags: vec![
                "auto-generated".into(),
                level.as_str().into(),
                table_name.to_string(),
                tenant_id.to_string(),
            ],
            compliance: Some(ComplianceFlags {
                gdpr: true,
                sox: level == AccessLevel::AdminOnly,
                hipaa: false,
                pci: req.enforce_isolation,
            }),
            ..PolicyMetadata::default()
        },
    }
}

/// Generate and store a policy.
pub fn generate_tenant_policy(
    store: &PolicyStore,
    tenant_id: &str,
    table_name: &str,
    req: &PolicyRequirements,
) -> Result<TenantPolicy> {
    store.create_policy(build_policy(tenant_id, table_name, req))
}
