//! In-memory policy and rule store, keyed by generated id.
//!
//! Reads filter by tenant, sort by descending priority and only then
//! truncate to `limit`. Equal priorities keep insertion order, so two reads
//! with no write in between return the same sequence.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use dashmap::DashMap;

use tenantrls_core::error::Result;
use tenantrls_core::model::{
    NewTenantPolicy, NewTenantRule, PolicyOperation, TenantPolicy, TenantRule, TenantScope,
};

use crate::id;

use super::matcher::condition;

/// Filters for [`PolicyStore::tenant_policies`].
#[derive(Debug, Clone, Default)]
pub struct PolicyFilter {
    pub table_name: Option<String>,
    /// Keeps policies scoped to this operation or to `ALL`.
    pub operation: Option<PolicyOperation>,
    pub is_active: Option<bool>,
    pub enforce_tenant_isolation: Option<bool>,
    pub limit: Option<usize>,
}

/// Filters for [`PolicyStore::tenant_rules`].
#[derive(Debug, Clone, Default)]
pub struct RuleFilter {
    pub is_active: Option<bool>,
    /// Keeps rules conditioned on this role or on no role at all.
    pub role: Option<String>,
    pub tenant_scope: Option<TenantScope>,
    pub limit: Option<usize>,
}

struct Entry<T> {
    seq: u64,
    item: T,
}

/// Owner of all tenant policies and rules.
pub struct PolicyStore {
    policies: DashMap<String, Entry<TenantPolicy>>,
    rules: DashMap<String, Entry<TenantRule>>,
    seq: AtomicU64,
}

impl Default for PolicyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyStore {
    pub fn new() -> Self {
        Self {
            policies: DashMap::new(),
            rules: DashMap::new(),
            seq: AtomicU64::new(1),
        }
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }

    pub fn create_policy(&self, new: NewTenantPolicy) -> Result<TenantPolicy> {
        new.validate()?;
        let policy = TenantPolicy::from_new(id::generate("tenant_policy"), new, Utc::now());
        self.insert_policy(policy.clone());

        tracing::info!(
            policy_id = %policy.id,
            tenant_id = %policy.tenant_id,
            organization_id = %policy.organization_id,
            table = %policy.table_name,
            policy_name = %policy.policy_name,
            "tenant policy created"
        );
        Ok(policy)
    }

    /// Insert a fully-formed policy under its own id (seeding, imports).
    pub fn insert_policy(&self, policy: TenantPolicy) {
        let seq = self.next_seq();
        self.policies.insert(policy.id.clone(), Entry { seq, item: policy });
    }

    pub fn create_rule(&self, new: NewTenantRule) -> Result<TenantRule> {
        new.validate()?;
        let rule = TenantRule::from_new(id::generate("tenant_rule"), new, Utc::now());
        self.insert_rule(rule.clone());

        tracing::info!(
            rule_id = %rule.id,
            tenant_id = %rule.tenant_id,
            organization_id = %rule.organization_id,
            rule_name = %rule.rule_name,
            "tenant rule created"
        );
        Ok(rule)
    }

    pub fn insert_rule(&self, rule: TenantRule) {
        let seq = self.next_seq();
        self.rules.insert(rule.id.clone(), Entry { seq, item: rule });
    }

    /// Policy by id, only if it belongs to `tenant_id`.
    pub fn policy(&self, tenant_id: &str, policy_id: &str) -> Option<TenantPolicy> {
        self.policies
            .get(policy_id)
            .filter(|e| e.item.tenant_id == tenant_id)
            .map(|e| e.item.clone())
    }

    pub fn rule(&self, tenant_id: &str, rule_id: &str) -> Option<TenantRule> {
        self.rules
            .get(rule_id)
            .filter(|e| e.item.tenant_id == tenant_id)
            .map(|e| e.item.clone())
    }

    pub fn tenant_policies(&self, tenant_id: &str, f: &PolicyFilter) -> Vec<TenantPolicy> {
        let mut hits: Vec<(u64, TenantPolicy)> = self
            .policies
            .iter()
            .filter(|e| {
                let p = &e.item;
                if p.tenant_id != tenant_id {
                    return false;
                }
                if let Some(t) = &f.table_name {
                    if &p.table_name != t {
                        return false;
                    }
                }
                if let Some(op) = f.operation {
                    let scoped = p.configuration.operation;
                    if scoped != op && scoped != PolicyOperation::All {
                        return false;
                    }
                }
                if let Some(active) = f.is_active {
                    if p.configuration.is_active != active {
                        return false;
                    }
                }
                if let Some(iso) = f.enforce_tenant_isolation {
                    if p.configuration.enforce_tenant_isolation != iso {
                        return false;
                    }
                }
                true
            })
            .map(|e| (e.seq, e.item.clone()))
            .collect();

        hits.sort_by(|(sa, a), (sb, b)| b.priority().cmp(&a.priority()).then(sa.cmp(sb)));
        truncate(hits, f.limit)
    }

    pub fn tenant_rules(&self, tenant_id: &str, f: &RuleFilter) -> Vec<TenantRule> {
        let mut hits: Vec<(u64, TenantRule)> = self
            .rules
            .iter()
            .filter(|e| {
                let r = &e.item;
                if r.tenant_id != tenant_id {
                    return false;
                }
                if let Some(active) = f.is_active {
                    if r.configuration.is_active != active {
                        return false;
                    }
                }
                if let Some(role) = &f.role {
                    match condition(&r.conditions.context.role) {
                        Some(want) if want != role.as_str() => return false,
                        _ => {}
                    }
                }
                if let Some(scope) = f.tenant_scope {
                    if r.configuration.tenant_scope != scope {
                        return false;
                    }
                }
                true
            })
            .map(|e| (e.seq, e.item.clone()))
            .collect();

        hits.sort_by(|(sa, a), (sb, b)| b.priority().cmp(&a.priority()).then(sa.cmp(sb)));
        truncate(hits, f.limit)
    }

    pub fn policy_count(&self) -> usize {
        self.policies.len()
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

// A zero limit means "no limit".
fn truncate<T>(hits: Vec<(u64, T)>, limit: Option<usize>) -> Vec<T> {
    let it = hits.into_iter().map(|(_, item)| item);
    match limit {
        Some(n) if n > 0 => it.take(n).collect(),
        _ => it.collect(),
    }
}
