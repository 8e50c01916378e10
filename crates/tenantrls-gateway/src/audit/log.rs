use std::collections::VecDeque;
use std::sync::{PoisonError, RwLock};

use chrono::Utc;

use tenantrls_core::model::{NewAuditLog, TenantAuditLog};

use crate::id;

/// Append-only audit ring. Records are never updated; once `max_entries` is
/// reached the oldest record is dropped for each new one.
pub struct AuditLog {
    entries: RwLock<VecDeque<TenantAuditLog>>,
    max_entries: usize,
}

impl AuditLog {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(VecDeque::new()),
            max_entries: max_entries.max(1),
        }
    }

    pub fn log_access(&self, new: NewAuditLog) -> TenantAuditLog {
        let rec = TenantAuditLog::from_new(id::generate("tenant_audit"), new, Utc::now());

        {
            // A poisoned lock still holds a consistent deque: every mutation
            // below is a single push or pop.
            let mut g = self.entries.write().unwrap_or_else(PoisonError::into_inner);
            while g.len() >= self.max_entries {
                g.pop_front();
            }
            g.push_back(rec.clone());
        }

        tracing::info!(
            audit_id = %rec.id,
            tenant_id = %rec.tenant_id,
            user_id = %rec.user_id,
            op = %rec.operation.op_type,
            table = %rec.operation.table_name,
            allowed = rec.result.allowed,
            tenant_isolation = rec.result.tenant_isolation_enforced,
            "tenant access logged"
        );
        rec
    }

    /// Records of `tenant_id`, oldest first.
    pub fn tenant_entries(&self, tenant_id: &str) -> Vec<TenantAuditLog> {
        let g = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        g.iter().filter(|e| e.tenant_id == tenant_id).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tenantrls_core::model::{AccessEvaluationResult, Operation, OperationType, TenantSecurityContext};

    fn record(tenant: &str, allowed: bool) -> NewAuditLog {
        let ctx = TenantSecurityContext::new(tenant, "u1");
        let op = Operation::new(OperationType::Select, "invoices");
        let res = AccessEvaluationResult {
            allowed,
            reason: "r".into(),
            policies_applied: vec![],
            rules_evaluated: vec![],
            execution_time: 0.1,
            tenant_isolation_enforced: false,
        };
        NewAuditLog::from_evaluation(&ctx, &op, &res, None)
    }

    #[test]
    fn stamps_id_and_keeps_tenant_order() {
        let log = AuditLog::new(10);
        let a = log.log_access(record("t1", true));
        log.log_access(record("t2", true));
        let b = log.log_access(record("t1", false));

        assert!(a.id.starts_with("tenant_audit_"));
        let ids: Vec<_> = log.tenant_entries("t1").into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![a.id, b.id]);
    }

    #[test]
    fn ring_drops_oldest() {
        let log = AuditLog::new(2);
        let first = log.log_access(record("t1", true));
        log.log_access(record("t1", true));
        log.log_access(record("t1", true));
        assert_eq!(log.len(), 2);
        assert!(log.tenant_entries("t1").iter().all(|e| e.id != first.id));
    }
}
