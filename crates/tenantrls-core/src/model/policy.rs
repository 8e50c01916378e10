//! Tenant policies: table/operation-scoped access grants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, TenantRlsError};
use crate::model::operation::PolicyOperation;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PolicyConfiguration {
    pub operation: PolicyOperation,
    pub is_active: bool,
    /// Higher is preferred.
    pub priority: i32,
    #[serde(rename = "bypassRLS")]
    pub bypass_rls: bool,
    pub enforce_tenant_isolation: bool,
}

impl Default for PolicyConfiguration {
    fn default() -> Self {
        Self {
            operation: PolicyOperation::All,
            is_active: true,
            priority: 1,
            bypass_rls: false,
            enforce_tenant_isolation: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConditionType {
    #[default]
    TenantIsolation,
    RoleBased,
    UserBased,
    Custom,
    Hybrid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct TenantConditions {
    pub strict_isolation: bool,
    pub cross_tenant_access: bool,
    pub shared_data_access: bool,
}

/// Descriptive filter metadata. `expression` is recorded for audit and
/// documentation and is never parsed or executed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct PolicyConditions {
    #[serde(rename = "type")]
    pub condition_type: ConditionType,
    pub expression: String,
    pub parameters: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_conditions: Option<TenantConditions>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct TenantRestrictions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_tenants: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked_tenants: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cross_tenant_operations: Option<Vec<String>>,
}

impl TenantRestrictions {
    /// True when `op` is listed as a permitted cross-tenant operation.
    pub fn exposes_cross_tenant(&self, op: &str) -> bool {
        self.cross_tenant_operations
            .as_ref()
            .is_some_and(|ops| ops.iter().any(|o| o == op))
    }
}

/// Wall-clock minute of the day, parsed from `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeOfDay {
    pub hour: u32,
    pub minute: u32,
}

impl TimeOfDay {
    pub fn new(hour: u32, minute: u32) -> Self {
        Self { hour, minute }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let (h, m) = s.trim().split_once(':')?;
        let hour: u32 = h.parse().ok()?;
        let minute: u32 = m.parse().ok()?;
        if hour > 23 || minute > 59 {
            return None;
        }
        Some(Self { hour, minute })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct TimeRestrictions {
    /// `HH:MM`, inclusive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    /// `HH:MM`, inclusive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    /// 0 = Sunday .. 6 = Saturday.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_of_week: Option<Vec<u8>>,
}

impl TimeRestrictions {
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [("startTime", &self.start_time), ("endTime", &self.end_time)] {
            if let Some(v) = value {
                if TimeOfDay::parse(v).is_none() {
                    return Err(TenantRlsError::BadRequest(format!(
                        "timeRestrictions.{field} must be HH:MM, got {v:?}"
                    )));
                }
            }
        }
        if let Some(days) = &self.days_of_week {
            if days.iter().any(|d| *d > 6) {
                return Err(TenantRlsError::BadRequest(
                    "timeRestrictions.daysOfWeek entries must be between 0 and 6".into(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct IpRestrictions {
    #[serde(rename = "allowedIPs", skip_serializing_if = "Option::is_none")]
    pub allowed_ips: Option<Vec<String>>,
    #[serde(rename = "blockedIPs", skip_serializing_if = "Option::is_none")]
    pub blocked_ips: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct AccessRules {
    /// `None` admits every role; an empty list admits none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_restrictions: Option<TenantRestrictions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_restrictions: Option<TimeRestrictions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_restrictions: Option<IpRestrictions>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ComplianceFlags {
    pub gdpr: bool,
    pub sox: bool,
    pub hipaa: bool,
    pub pci: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PolicyMetadata {
    pub created_by: String,
    pub last_modified_by: String,
    pub version: u32,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compliance: Option<ComplianceFlags>,
}

impl Default for PolicyMetadata {
    fn default() -> Self {
        Self {
            created_by: "system".into(),
            last_modified_by: "system".into(),
            version: 1,
            tags: Vec::new(),
            documentation: None,
            compliance: None,
        }
    }
}

/// Creation input: a policy without its generated id and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTenantPolicy {
    pub tenant_id: String,
    #[serde(default = "default_organization")]
    pub organization_id: String,
    pub table_name: String,
    pub policy_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub configuration: PolicyConfiguration,
    #[serde(default)]
    pub conditions: PolicyConditions,
    #[serde(default)]
    pub access_rules: AccessRules,
    #[serde(default)]
    pub metadata: PolicyMetadata,
}

impl NewTenantPolicy {
    pub fn new(
        tenant_id: impl Into<String>,
        table_name: impl Into<String>,
        policy_name: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            organization_id: default_organization(),
            table_name: table_name.into(),
            policy_name: policy_name.into(),
            description: None,
            configuration: PolicyConfiguration::default(),
            conditions: PolicyConditions::default(),
            access_rules: AccessRules::default(),
            metadata: PolicyMetadata::default(),
        }
    }

    /// Reject empty identifiers and malformed restrictions.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.tenant_id.is_empty() {
            missing.push("tenantId");
        }
        if self.table_name.is_empty() {
            missing.push("tableName");
        }
        if self.policy_name.is_empty() {
            missing.push("policyName");
        }
        if !missing.is_empty() {
            return Err(TenantRlsError::missing(missing));
        }
        if let Some(tr) = &self.access_rules.time_restrictions {
            tr.validate()?;
        }
        Ok(())
    }
}

/// A named, versioned access rule scoped to `(tenant_id, table_name)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantPolicy {
    pub id: String,
    pub tenant_id: String,
    pub organization_id: String,
    pub table_name: String,
    pub policy_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub configuration: PolicyConfiguration,
    pub conditions: PolicyConditions,
    pub access_rules: AccessRules,
    pub metadata: PolicyMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TenantPolicy {
    pub fn from_new(id: String, new: NewTenantPolicy, now: DateTime<Utc>) -> Self {
        Self {
            id,
            tenant_id: new.tenant_id,
            organization_id: new.organization_id,
            table_name: new.table_name,
            policy_name: new.policy_name,
            description: new.description,
            configuration: new.configuration,
            conditions: new.conditions,
            access_rules: new.access_rules,
            metadata: new.metadata,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.configuration.is_active
    }

    pub fn priority(&self) -> i32 {
        self.configuration.priority
    }

    /// Lists `op` as a cross-tenant operation in its tenant restrictions.
    pub fn exposes_cross_tenant(&self, op: &str) -> bool {
        self.access_rules
            .tenant_restrictions
            .as_ref()
            .is_some_and(|tr| tr.exposes_cross_tenant(op))
    }

    pub fn compliance(&self) -> ComplianceFlags {
        self.metadata.compliance.unwrap_or_default()
    }
}

fn default_organization() -> String {
    crate::model::context::DEFAULT_ORGANIZATION.into()
}
