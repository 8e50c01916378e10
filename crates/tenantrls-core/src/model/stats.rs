//! Per-tenant aggregates over policies, rules and audit records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AccessStats {
    pub total_access_attempts: usize,
    pub allowed_access: usize,
    pub denied_access: usize,
    pub tenant_isolation_violations: usize,
    /// Mean `executionTime` in milliseconds; 0 when nothing was logged.
    pub average_execution_time: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TenantBreakdown {
    pub policies: usize,
    pub rules: usize,
    pub access_attempts: usize,
    pub violations: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceStats {
    pub gdpr_compliant: usize,
    pub sox_compliant: usize,
    pub hipaa_compliant: usize,
    pub pci_compliant: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TenantStats {
    pub total_policies: usize,
    pub active_policies: usize,
    pub total_rules: usize,
    pub active_rules: usize,
    pub tenant_isolation_policies: usize,
    pub cross_tenant_policies: usize,
    pub access_stats: AccessStats,
    pub by_tenant: BTreeMap<String, TenantBreakdown>,
    pub by_operation: BTreeMap<String, usize>,
    pub by_table: BTreeMap<String, usize>,
    pub compliance_stats: ComplianceStats,
}
