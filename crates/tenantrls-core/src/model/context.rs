//! Per-session security context.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role granted cross-tenant reach when paired with [`CROSS_TENANT_PERMISSION`].
pub const ADMIN_ROLE: &str = "admin";
/// Permission that lets an admin operate on other tenants.
pub const CROSS_TENANT_PERMISSION: &str = "cross_tenant_access";
/// Organization assumed when the caller names none.
pub const DEFAULT_ORGANIZATION: &str = "default";
/// Role assumed when the caller names none.
pub const DEFAULT_ROLE: &str = "user";
/// Permission assumed when the caller names none.
pub const DEFAULT_PERMISSION: &str = "read";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantType {
    Enterprise,
    SmallBusiness,
    Individual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionLevel {
    Basic,
    Premium,
    Enterprise,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantMetadata {
    pub tenant_type: TenantType,
    pub subscription_level: SubscriptionLevel,
    pub data_retention_days: u32,
    #[serde(default)]
    pub compliance_requirements: Vec<String>,
}

/// Who is asking, for which tenant and organization, from where.
///
/// Built once per inbound request and never mutated after evaluation; the
/// next request supersedes it with a fresh context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantSecurityContext {
    pub user_id: String,
    #[serde(default = "default_organization")]
    pub organization_id: String,
    pub tenant_id: String,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default = "default_permissions")]
    pub permissions: BTreeSet<String>,
    #[serde(default)]
    pub session_id: String,
    #[serde(default = "unknown")]
    pub ip_address: String,
    #[serde(default = "unknown")]
    pub user_agent: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_metadata: Option<TenantMetadata>,
}

impl TenantSecurityContext {
    /// Context with the fallback organization, role and permissions applied.
    pub fn new(tenant_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            organization_id: default_organization(),
            tenant_id: tenant_id.into(),
            role: default_role(),
            permissions: default_permissions(),
            session_id: String::new(),
            ip_address: unknown(),
            user_agent: unknown(),
            timestamp: Utc::now(),
            tenant_metadata: None,
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    pub fn with_permissions<I, S>(mut self, perms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions = perms.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_organization(mut self, org: impl Into<String>) -> Self {
        self.organization_id = org.into();
        self
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip_address = ip.into();
        self
    }

    pub fn has_permission(&self, perm: &str) -> bool {
        self.permissions.contains(perm)
    }

    /// All-required semantics: every listed permission must be held.
    pub fn has_all_permissions(&self, perms: &[String]) -> bool {
        perms.iter().all(|p| self.permissions.contains(p))
    }

    /// Admin holding the cross-tenant permission.
    pub fn can_cross_tenants(&self) -> bool {
        self.role == ADMIN_ROLE && self.has_permission(CROSS_TENANT_PERMISSION)
    }
}

fn default_organization() -> String {
    DEFAULT_ORGANIZATION.into()
}
fn default_role() -> String {
    DEFAULT_ROLE.into()
}
fn default_permissions() -> BTreeSet<String> {
    BTreeSet::from([DEFAULT_PERMISSION.to_string()])
}
fn unknown() -> String {
    "unknown".into()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn minimal_json_gets_fallbacks() {
        let ctx: TenantSecurityContext =
            serde_json::from_str(r#"{"tenantId":"t1","userId":"u1"}"#).unwrap();
        assert_eq!(ctx.organization_id, "default");
        assert_eq!(ctx.role, "user");
        assert!(ctx.has_permission("read"));
        assert!(ctx.session_id.is_empty());
    }

    #[test]
    fn cross_tenant_needs_admin_and_permission() {
        let admin = TenantSecurityContext::new("t1", "u1").with_role("admin");
        assert!(!admin.can_cross_tenants());
        let admin = admin.with_permissions(["read", "cross_tenant_access"]);
        assert!(admin.can_cross_tenants());
        let user = TenantSecurityContext::new("t1", "u1").with_permissions(["cross_tenant_access"]);
        assert!(!user.can_cross_tenants());
    }
}
