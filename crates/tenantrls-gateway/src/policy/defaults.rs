//! Demo policies and rule for tenant `default`.

use chrono::{Duration, Utc};
use serde_json::{Map, Value};

use tenantrls_core::model::{
    ComplianceFlags, ConditionType, ContextConditions, DataConditions, NewTenantPolicy,
    NewTenantRule, PolicyOperation, RuleActionType, RuleTenantIsolation, TenantConditions,
    TenantPolicy, TenantRestrictions, TenantRule,
};

use super::store::PolicyStore;

pub const DEFAULT_TENANT: &str = "default";
pub const DEFAULT_ORGANIZATION: &str = "demo-org-1";

fn params(pairs: &[(&str, &str)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), Value::from(*v)))
        .collect()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn compliance(gdpr: bool, sox: bool, pci: bool) -> Option<ComplianceFlags> {
    Some(ComplianceFlags {
        gdpr,
        sox,
        hipaa: false,
        pci,
    })
}

pub fn default_policies() -> Vec<NewTenantPolicy> {
    let mut strict = NewTenantPolicy::new(DEFAULT_TENANT, "invoices", "strict_tenant_isolation");
    strict.organization_id = DEFAULT_ORGANIZATION.into();
    strict.description = Some("Strict per-tenant isolation: only rows of the current tenant".into());
    strict.configuration.priority = 10;
    strict.conditions.condition_type = ConditionType::TenantIsolation;
    strict.conditions.expression = "tenant_id = $1".into();
    strict.conditions.parameters = params(&[("tenantId", "current_tenant")]);
    strict.conditions.tenant_conditions = Some(TenantConditions {
        strict_isolation: true,
        ..Default::default()
    });
    strict.access_rules.roles = Some(strings(&["admin", "user", "viewer"]));
    strict.access_rules.tenant_restrictions = Some(TenantRestrictions {
        allowed_tenants: Some(strings(&["current_tenant"])),
        blocked_tenants: Some(Vec::new()),
        cross_tenant_operations: Some(Vec::new()),
    });
    strict.metadata.tags = strings(&["tenant-isolation", "strict", "invoices"]);
    strict.metadata.documentation = Some("Strict tenant isolation policy".into());
    strict.metadata.compliance = compliance(true, true, true);

    let mut role_based = NewTenantPolicy::new(DEFAULT_TENANT, "customers", "role_based_tenant_access");
    role_based.organization_id = DEFAULT_ORGANIZATION.into();
    role_based.description = Some("Role-based customer access within the tenant".into());
    role_based.configuration.operation = PolicyOperation::Select;
    role_based.configuration.priority = 8;
    role_based.conditions.condition_type = ConditionType::RoleBased;
    role_based.conditions.expression = "tenant_id = $1 AND (created_by = $2 OR role = $3)".into();
    role_based.conditions.parameters = params(&[
        ("tenantId", "current_tenant"),
        ("createdBy", "current_user_id"),
        ("role", "admin"),
    ]);
    role_based.conditions.tenant_conditions = Some(TenantConditions {
        strict_isolation: true,
        ..Default::default()
    });
    role_based.access_rules.roles = Some(strings(&["admin", "user"]));
    role_based.access_rules.tenant_restrictions = Some(TenantRestrictions {
        allowed_tenants: Some(strings(&["current_tenant"])),
        blocked_tenants: None,
        cross_tenant_operations: Some(Vec::new()),
    });
    role_based.metadata.tags = strings(&["role-based", "tenant-isolation", "customers"]);
    role_based.metadata.compliance = compliance(true, false, false);

    let mut cross = NewTenantPolicy::new(DEFAULT_TENANT, "organizations", "cross_tenant_admin_access");
    cross.organization_id = DEFAULT_ORGANIZATION.into();
    cross.description = Some("Cross-tenant access for organization administrators".into());
    cross.configuration.operation = PolicyOperation::Select;
    cross.configuration.priority = 5;
    cross.configuration.enforce_tenant_isolation = false;
    cross.conditions.condition_type = ConditionType::RoleBased;
    cross.conditions.expression = "organization_id = $1 AND role = $2".into();
    cross.conditions.parameters = params(&[("organizationId", "current_organization"), ("role", "admin")]);
    cross.conditions.tenant_conditions = Some(TenantConditions {
        strict_isolation: false,
        cross_tenant_access: true,
        shared_data_access: true,
    });
    cross.access_rules.roles = Some(strings(&["admin"]));
    cross.access_rules.tenant_restrictions = Some(TenantRestrictions {
        cross_tenant_operations: Some(strings(&["SELECT", "READ"])),
        ..Default::default()
    });
    cross.metadata.tags = strings(&["cross-tenant", "admin", "organizations"]);
    cross.metadata.compliance = compliance(true, true, false);

    vec![strict, role_based, cross]
}

pub fn default_rules() -> Vec<NewTenantRule> {
    let mut isolation = NewTenantRule::new(DEFAULT_TENANT, "tenant_isolation_enforcement");
    isolation.organization_id = DEFAULT_ORGANIZATION.into();
    isolation.description = Some("Enforce strict tenant isolation".into());
    isolation.configuration.priority = 10;
    isolation.configuration.stop_on_match = true;
    isolation.conditions.context = ContextConditions {
        tenant_id: Some("current_tenant".into()),
        ..Default::default()
    };
    isolation.conditions.data = DataConditions {
        operation: Some("ALL".into()),
        ..Default::default()
    };
    isolation.actions.action_type = RuleActionType::TenantIsolate;
    isolation.actions.parameters = Map::from_iter([
        ("enforceIsolation".to_string(), Value::Bool(true)),
        ("allowedTenants".to_string(), Value::from(vec!["current_tenant"])),
    ]);
    isolation.actions.message = Some("tenant isolation applied".into());
    isolation.actions.tenant_isolation = Some(RuleTenantIsolation {
        enforce: true,
        allowed_tenants: ["current_tenant".to_string()].into_iter().collect(),
    });
    isolation.metadata.tags = strings(&["tenant-isolation", "enforcement"]);

    vec![isolation]
}

/// Insert the demo set under fixed ids, dated thirty days back.
pub fn seed(store: &PolicyStore) {
    let created = Utc::now() - Duration::days(30);

    for (i, p) in default_policies().into_iter().enumerate() {
        store.insert_policy(TenantPolicy::from_new(format!("tenant_policy_{}", i + 1), p, created));
    }
    for (i, r) in default_rules().into_iter().enumerate() {
        store.insert_rule(TenantRule::from_new(format!("tenant_rule_{}", i + 1), r, created));
    }

    tracing::info!(
        tenant_id = DEFAULT_TENANT,
        policies = store.policy_count(),
        rules = store.rule_count(),
        "default tenant policies seeded"
    );
}
