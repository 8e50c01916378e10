use tenantrls_core::model::{
    AccessStats, ComplianceStats, TenantAuditLog, TenantBreakdown, TenantStats,
};

use crate::policy::{PolicyFilter, PolicyStore, RuleFilter};

use super::log::AuditLog;

/// Aggregate counts over the tenant's policies, rules and audit records.
pub fn tenant_stats(store: &PolicyStore, audit: &AuditLog, tenant_id: &str) -> TenantStats {
    let policies = store.tenant_policies(tenant_id, &PolicyFilter::default());
    let rules = store.tenant_rules(tenant_id, &RuleFilter::default());
    let logs = audit.tenant_entries(tenant_id);

    let mut stats = TenantStats {
        total_policies: policies.len(),
        active_policies: policies.iter().filter(|p| p.is_active()).count(),
        total_rules: rules.len(),
        active_rules: rules.iter().filter(|r| r.is_active()).count(),
        tenant_isolation_policies: policies
            .iter()
            .filter(|p| p.configuration.enforce_tenant_isolation)
            .count(),
        cross_tenant_policies: policies
            .iter()
            .filter(|p| !p.configuration.enforce_tenant_isolation)
            .count(),
        access_stats: access_stats(&logs),
        ..TenantStats::default()
    };

    for log in &logs {
        let b = stats
            .by_tenant
            .entry(log.tenant_id.clone())
            .or_insert_with(|| TenantBreakdown {
                policies: policies.len(),
                rules: rules.len(),
                ..TenantBreakdown::default()
            });
        b.access_attempts += 1;
        if log.is_isolation_violation() {
            b.violations += 1;
        }

        *stats
            .by_operation
            .entry(log.operation.op_type.as_str().to_string())
            .or_default() += 1;
        *stats
            .by_table
            .entry(log.operation.table_name.clone())
            .or_default() += 1;
    }

    stats.compliance_stats = policies.iter().map(|p| p.compliance()).fold(
        ComplianceStats::default(),
        |mut acc, c| {
            acc.gdpr_compliant += usize::from(c.gdpr);
            acc.sox_compliant += usize::from(c.sox);
            acc.hipaa_compliant += usize::from(c.hipaa);
            acc.pci_compliant += usize::from(c.pci);
            acc
        },
    );

    stats
}

fn access_stats(logs: &[TenantAuditLog]) -> AccessStats {
    let total = logs.len();
    let allowed = logs.iter().filter(|l| l.result.allowed).count();
    let average_execution_time = if total == 0 {
        0.0
    } else {
        logs.iter().map(|l| l.result.execution_time).sum::<f64>() / total as f64
    };

    AccessStats {
        total_access_attempts: total,
        allowed_access: allowed,
        denied_access: total - allowed,
        tenant_isolation_violations: logs.iter().filter(|l| l.is_isolation_violation()).count(),
        average_execution_time,
    }
}
