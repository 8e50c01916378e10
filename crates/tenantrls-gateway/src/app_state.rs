//! Shared application state for the tenant RLS gateway.
//!
//! Every store is constructed once here and handed to handlers through axum
//! `State`; no other component owns a store.

use std::sync::Arc;
use std::time::Duration;

use tenantrls_core::error::Result;
use tenantrls_core::model::{
    AccessEvaluationResult, NewAuditLog, Operation, TenantAuditLog, TenantSecurityContext,
};

use crate::audit::AuditLog;
use crate::config::EngineConfig;
use crate::context::ContextRegistry;
use crate::obs::EngineMetrics;
use crate::policy::{defaults, AccessEvaluator, PolicyStore};

#[derive(Clone)]
pub struct AppState {
    cfg: Arc<EngineConfig>,
    store: Arc<PolicyStore>,
    evaluator: Arc<AccessEvaluator>,
    contexts: Arc<ContextRegistry>,
    audit: Arc<AuditLog>,
    metrics: Arc<EngineMetrics>,
}

impl AppState {
    /// Build application state from a loaded config.
    /// Returns Result so main can report bad configs without panicking.
    pub fn new(cfg: EngineConfig) -> Result<Self> {
        cfg.validate()?;

        let store = Arc::new(PolicyStore::new());
        if cfg.seed_defaults {
            defaults::seed(&store);
        }

        let evaluator = Arc::new(AccessEvaluator::new(Arc::clone(&store), cfg.evaluator.clock));
        let contexts = Arc::new(ContextRegistry::new(
            cfg.registry.max_contexts,
            Duration::from_secs(cfg.registry.context_ttl_secs),
        ));
        let audit = Arc::new(AuditLog::new(cfg.audit.max_entries));

        Ok(Self {
            cfg: Arc::new(cfg),
            store,
            evaluator,
            contexts,
            audit,
            metrics: Arc::new(EngineMetrics::default()),
        })
    }

    pub fn cfg(&self) -> &EngineConfig {
        &self.cfg
    }

    pub fn store(&self) -> &PolicyStore {
        &self.store
    }

    pub fn evaluator(&self) -> &AccessEvaluator {
        &self.evaluator
    }

    pub fn contexts(&self) -> &ContextRegistry {
        &self.contexts
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    /// Evaluate `op` for `ctx` and append exactly one audit record for it.
    pub fn evaluate_and_audit(
        &self,
        ctx: &TenantSecurityContext,
        op: &Operation,
        request_id: Option<String>,
    ) -> (AccessEvaluationResult, TenantAuditLog) {
        let result = self.evaluator.evaluate_access(ctx, op);
        self.metrics
            .record_evaluation(&ctx.tenant_id, result.allowed, result.execution_time);

        let rec = self
            .audit
            .log_access(NewAuditLog::from_evaluation(ctx, op, &result, request_id));
        (result, rec)
    }

    /// Gauge lines appended to `/metrics`.
    pub fn metrics_extra(&self) -> Vec<(&'static str, u64)> {
        vec![
            ("tenantrls_policies", self.store.policy_count() as u64),
            ("tenantrls_rules", self.store.rule_count() as u64),
            ("tenantrls_contexts", self.contexts.len() as u64),
            ("tenantrls_audit_entries", self.audit.len() as u64),
        ]
    }
}
