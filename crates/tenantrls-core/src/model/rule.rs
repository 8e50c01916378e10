//! Tenant rules: ordered gates evaluated before any policy.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, TenantRlsError};

/// Reach of a rule across tenants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TenantScope {
    #[default]
    Single,
    #[serde(alias = "multi")]
    Shared,
    Global,
}

impl TenantScope {
    pub fn as_str(self) -> &'static str {
        match self {
            TenantScope::Single => "single",
            TenantScope::Shared => "shared",
            TenantScope::Global => "global",
        }
    }
}

impl std::str::FromStr for TenantScope {
    type Err = TenantRlsError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "single" => Ok(TenantScope::Single),
            "shared" | "multi" => Ok(TenantScope::Shared),
            "global" => Ok(TenantScope::Global),
            other => Err(TenantRlsError::BadRequest(format!("unknown tenantScope: {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuleConfiguration {
    pub is_active: bool,
    pub priority: i32,
    pub evaluation_order: i32,
    /// Halts rule iteration after this rule is evaluated, matched or not.
    pub stop_on_match: bool,
    pub tenant_scope: TenantScope,
}

impl Default for RuleConfiguration {
    fn default() -> Self {
        Self {
            is_active: true,
            priority: 1,
            evaluation_order: 1,
            stop_on_match: false,
            tenant_scope: TenantScope::Single,
        }
    }
}

/// Requirements on the caller; every present field must match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ContextConditions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
}

/// Requirements on the operation; every present field must match.
///
/// `operation` is compared literally against the statement kind, so `"ALL"`
/// here matches nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct DataConditions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RuleConditions {
    pub context: ContextConditions,
    pub data: DataConditions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RuleActionType {
    Allow,
    #[default]
    Deny,
    TenantIsolate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct RuleTenantIsolation {
    pub enforce: bool,
    pub allowed_tenants: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct RuleActions {
    #[serde(rename = "type")]
    pub action_type: RuleActionType,
    pub parameters: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_isolation: Option<RuleTenantIsolation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuleMetadata {
    pub created_by: String,
    pub last_modified_by: String,
    pub version: u32,
    pub tags: Vec<String>,
}

impl Default for RuleMetadata {
    fn default() -> Self {
        Self {
            created_by: "system".into(),
            last_modified_by: "system".into(),
            version: 1,
            tags: Vec::new(),
        }
    }
}

/// Creation input: a rule without its generated id and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTenantRule {
    pub tenant_id: String,
    #[serde(default = "default_organization")]
    pub organization_id: String,
    pub rule_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub configuration: RuleConfiguration,
    #[serde(default)]
    pub conditions: RuleConditions,
    #[serde(default)]
    pub actions: RuleActions,
    #[serde(default)]
    pub metadata: RuleMetadata,
}

impl NewTenantRule {
    pub fn new(tenant_id: impl Into<String>, rule_name: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            organization_id: default_organization(),
            rule_name: rule_name.into(),
            description: None,
            configuration: RuleConfiguration::default(),
            conditions: RuleConditions::default(),
            actions: RuleActions::default(),
            metadata: RuleMetadata::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.tenant_id.is_empty() {
            missing.push("tenantId");
        }
        if self.rule_name.is_empty() {
            missing.push("ruleName");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(TenantRlsError::missing(missing))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantRule {
    pub id: String,
    pub tenant_id: String,
    pub organization_id: String,
    pub rule_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub configuration: RuleConfiguration,
    pub conditions: RuleConditions,
    pub actions: RuleActions,
    pub metadata: RuleMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TenantRule {
    pub fn from_new(id: String, new: NewTenantRule, now: DateTime<Utc>) -> Self {
        Self {
            id,
            tenant_id: new.tenant_id,
            organization_id: new.organization_id,
            rule_name: new.rule_name,
            description: new.description,
            configuration: new.configuration,
            conditions: new.conditions,
            actions: new.actions,
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
}

fn default_organization() -> String {
    crate::model::context::DEFAULT_ORGANIZATION.into()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn multi_scope_reads_as_shared() {
        let c: RuleConfiguration = serde_json::from_str(r#"{"tenantScope":"multi"}"#).unwrap();
        assert_eq!(c.tenant_scope, TenantScope::Shared);
        assert!(c.is_active);
    }

    #[test]
    fn action_type_uses_snake_case() {
        let a: RuleActions = serde_json::from_str(r#"{"type":"tenant_isolate"}"#).unwrap();
        assert_eq!(a.action_type, RuleActionType::TenantIsolate);
        assert!(a.message.is_none());
    }
}
