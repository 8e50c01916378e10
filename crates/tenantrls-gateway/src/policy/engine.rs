use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDateTime;

use tenantrls_core::model::{
    AccessEvaluationResult, Operation, PolicyOperation, RuleActionType, TenantSecurityContext,
};

use crate::config::ClockSource;

use super::matcher::{policy_matches, rule_matches};
use super::store::{PolicyFilter, PolicyStore, RuleFilter};

pub const REASON_CROSS_TENANT: &str = "cross-tenant access not permitted";
pub const REASON_NO_MATCH: &str = "no tenant policy or rule permits access";
const REASON_RULE_ALLOW: &str = "allowed by tenant rule";
const REASON_RULE_DENY: &str = "access denied by tenant rule";

/// Access evaluator over a shared [`PolicyStore`].
///
/// Evaluation never fails: the absence of a matching rule or policy is the
/// ordinary deny path.
pub struct AccessEvaluator {
    store: Arc<PolicyStore>,
    clock: ClockSource,
}

impl AccessEvaluator {
    pub fn new(store: Arc<PolicyStore>, clock: ClockSource) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &Arc<PolicyStore> {
        &self.store
    }

    pub fn evaluate_access(&self, ctx: &TenantSecurityContext, op: &Operation) -> AccessEvaluationResult {
        self.evaluate_access_at(ctx, op, self.clock.now())
    }

    /// Evaluate with an explicit wall clock for time restrictions.
    pub fn evaluate_access_at(
        &self,
        ctx: &TenantSecurityContext,
        op: &Operation,
        now: NaiveDateTime,
    ) -> AccessEvaluationResult {
        let started = Instant::now();
        let elapsed = || started.elapsed().as_secs_f64() * 1000.0;

        // 1) cross-tenant guard, before any rule or policy is consulted
        if op.is_cross_tenant(&ctx.tenant_id) && !self.check_cross_tenant_access(ctx, op) {
            tracing::info!(
                tenant_id = %ctx.tenant_id,
                user_id = %ctx.user_id,
                target_tenant_id = ?op.target_tenant_id,
                table = %op.table_name,
                "cross-tenant access denied"
            );
            return AccessEvaluationResult {
                allowed: false,
                reason: REASON_CROSS_TENANT.into(),
                policies_applied: Vec::new(),
                rules_evaluated: Vec::new(),
                execution_time: elapsed(),
                tenant_isolation_enforced: true,
            };
        }

        // 2) + 3) candidates, highest priority first
        let rules = self.store.tenant_rules(
            &ctx.tenant_id,
            &RuleFilter {
                is_active: Some(true),
                role: Some(ctx.role.clone()),
                ..Default::default()
            },
        );
        let policies = self.store.tenant_policies(
            &ctx.tenant_id,
            &PolicyFilter {
                table_name: Some(op.table_name.clone()),
                operation: Some(PolicyOperation::from(op.op_type)),
                is_active: Some(true),
                ..Default::default()
            },
        );

        let mut rules_evaluated = Vec::new();
        let mut policies_applied = Vec::new();
        let mut isolation = false;

        // 4) rules
        for rule in &rules {
            rules_evaluated.push(rule.id.clone());

            if rule_matches(rule, ctx, op) {
                match rule.actions.action_type {
                    RuleActionType::Allow => {
                        return AccessEvaluationResult {
                            allowed: true,
                            reason: rule
                                .actions
                                .message
                                .clone()
                                .unwrap_or_else(|| REASON_RULE_ALLOW.into()),
                            policies_applied,
                            rules_evaluated,
                            execution_time: elapsed(),
                            tenant_isolation_enforced: isolation,
                        };
                    }
                    RuleActionType::Deny => {
                        tracing::info!(
                            tenant_id = %ctx.tenant_id,
                            rule_id = %rule.id,
                            table = %op.table_name,
                            "access denied by rule"
                        );
                        return AccessEvaluationResult {
                            allowed: false,
                            reason: rule
                                .actions
                                .message
                                .clone()
                                .unwrap_or_else(|| REASON_RULE_DENY.into()),
                            policies_applied,
                            rules_evaluated,
                            execution_time: elapsed(),
                            tenant_isolation_enforced: isolation,
                        };
                    }
                    RuleActionType::TenantIsolate => isolation = true,
                }
            }

            // stops after this rule whether or not it matched
            if rule.configuration.stop_on_match {
                break;
            }
        }

        // 5) policies
        for policy in &policies {
            policies_applied.push(policy.id.clone());

            if policy_matches(policy, ctx, now) {
                tracing::debug!(
                    tenant_id = %ctx.tenant_id,
                    policy_id = %policy.id,
                    table = %op.table_name,
                    op = %op.op_type,
                    "access allowed by policy"
                );
                return AccessEvaluationResult {
                    allowed: true,
                    reason: format!("allowed by tenant policy {}", policy.policy_name),
                    policies_applied,
                    rules_evaluated,
                    execution_time: elapsed(),
                    tenant_isolation_enforced: policy.configuration.enforce_tenant_isolation,
                };
            }
        }

        // 6) fail closed
        tracing::info!(
            tenant_id = %ctx.tenant_id,
            user_id = %ctx.user_id,
            table = %op.table_name,
            op = %op.op_type,
            rules = rules_evaluated.len(),
            policies = policies_applied.len(),
            "access denied: no match"
        );
        AccessEvaluationResult {
            allowed: false,
            reason: REASON_NO_MATCH.into(),
            policies_applied,
            rules_evaluated,
            execution_time: elapsed(),
            tenant_isolation_enforced: isolation,
        }
    }

    /// Cross-tenant exception: an admin holding `cross_tenant_access`, or an
    /// active non-isolating policy of the caller's tenant listing the
    /// operation type among its cross-tenant operations.
    pub fn check_cross_tenant_access(&self, ctx: &TenantSecurityContext, op: &Operation) -> bool {
        if ctx.can_cross_tenants() {
            return true;
        }

        self.store
            .tenant_policies(
                &ctx.tenant_id,
                &PolicyFilter {
                    is_active: Some(true),
                    enforce_tenant_isolation: Some(false),
                    ..Default::default()
                },
            )
            .iter()
            .any(|p| p.exposes_cross_tenant(op.op_type.as_str()))
    }
}
