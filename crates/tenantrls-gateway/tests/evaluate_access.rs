//! Access evaluator behaviour over an isolated store per test.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};

use tenantrls_core::model::{
    ContextConditions, IpRestrictions, NewTenantPolicy, NewTenantRule, Operation, OperationType,
    PolicyOperation, RuleActionType, TenantSecurityContext, TimeRestrictions,
};
use tenantrls_gateway::config::ClockSource;
use tenantrls_gateway::policy::engine::{REASON_CROSS_TENANT, REASON_NO_MATCH};
use tenantrls_gateway::policy::{defaults, AccessEvaluator, PolicyFilter, PolicyStore, RuleFilter};

// Monday 2024-01-01, 12:00.
fn monday_noon() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(12, 0, 0).unwrap()
}

fn evaluator() -> AccessEvaluator {
    AccessEvaluator::new(Arc::new(PolicyStore::new()), ClockSource::Utc)
}

fn invoices_policy(tenant: &str) -> NewTenantPolicy {
    let mut p = NewTenantPolicy::new(tenant, "invoices", "invoice_access");
    p.configuration.operation = PolicyOperation::All;
    p.configuration.priority = 10;
    p.configuration.enforce_tenant_isolation = true;
    p.access_rules.roles = Some(vec!["admin".into(), "user".into()]);
    p
}

fn select_invoices() -> Operation {
    Operation::new(OperationType::Select, "invoices")
}

#[test]
fn example_same_tenant_user_is_allowed() {
    let ev = evaluator();
    let p = ev.store().create_policy(invoices_policy("t1")).unwrap();

    let ctx = TenantSecurityContext::new("t1", "u1").with_role("user");
    let res = ev.evaluate_access_at(&ctx, &select_invoices(), monday_noon());

    assert!(res.allowed);
    assert!(res.tenant_isolation_enforced);
    assert_eq!(res.reason, "allowed by tenant policy invoice_access");
    assert_eq!(res.policies_applied, vec![p.id]);
}

#[test]
fn example_cross_tenant_caller_is_denied_before_consulting_anything() {
    let ev = evaluator();
    ev.store().create_policy(invoices_policy("t1")).unwrap();
    ev.store().create_policy(invoices_policy("t2")).unwrap();
    ev.store().create_rule(NewTenantRule::new("t2", "noop")).unwrap();

    let ctx = TenantSecurityContext::new("t2", "u2").with_role("user");
    let op = select_invoices().with_target_tenant("t1");
    let res = ev.evaluate_access_at(&ctx, &op, monday_noon());

    assert!(!res.allowed);
    assert!(res.tenant_isolation_enforced);
    assert_eq!(res.reason, REASON_CROSS_TENANT);
    assert!(res.policies_applied.is_empty());
    assert!(res.rules_evaluated.is_empty());
}

#[test]
fn admin_without_cross_tenant_permission_is_still_denied() {
    let ev = evaluator();
    let ctx = TenantSecurityContext::new("t2", "root").with_role("admin");
    let res = ev.evaluate_access_at(&ctx, &select_invoices().with_target_tenant("t1"), monday_noon());
    assert_eq!(res.reason, REASON_CROSS_TENANT);
}

#[test]
fn same_target_tenant_is_not_cross_tenant() {
    let ev = evaluator();
    ev.store().create_policy(invoices_policy("t1")).unwrap();
    let ctx = TenantSecurityContext::new("t1", "u1");
    let res = ev.evaluate_access_at(&ctx, &select_invoices().with_target_tenant("t1"), monday_noon());
    assert!(res.allowed);
}

#[test]
fn empty_target_tenant_is_not_cross_tenant() {
    let ev = evaluator();
    ev.store().create_policy(invoices_policy("t1")).unwrap();
    let ctx = TenantSecurityContext::new("t1", "u1").with_role("user");
    let res = ev.evaluate_access_at(&ctx, &select_invoices().with_target_tenant(""), monday_noon());
    assert!(res.allowed);
    assert_ne!(res.reason, REASON_CROSS_TENANT);
}

#[test]
fn deny_rule_with_empty_table_condition_applies_to_every_table() {
    let ev = evaluator();
    ev.store().create_policy(invoices_policy("t1")).unwrap();

    let mut deny = NewTenantRule::new("t1", "deny_everything");
    deny.conditions.data.table_name = Some(String::new());
    deny.actions.action_type = RuleActionType::Deny;
    deny.actions.message = Some("frozen".into());
    let rule = ev.store().create_rule(deny).unwrap();

    let ctx = TenantSecurityContext::new("t1", "u1").with_role("user");
    let res = ev.evaluate_access_at(&ctx, &select_invoices(), monday_noon());
    assert!(!res.allowed);
    assert_eq!(res.reason, "frozen");
    assert_eq!(res.rules_evaluated, vec![rule.id]);
}

#[test]
fn fail_closed_without_matching_policy() {
    let ev = evaluator();
    let mut other_table = invoices_policy("t1");
    other_table.table_name = "customers".into();
    ev.store().create_policy(other_table).unwrap();
    let mut other_op = invoices_policy("t1");
    other_op.configuration.operation = PolicyOperation::Delete;
    ev.store().create_policy(other_op).unwrap();

    let ctx = TenantSecurityContext::new("t1", "u1");
    let res = ev.evaluate_access_at(&ctx, &select_invoices(), monday_noon());
    assert!(!res.allowed);
    assert_eq!(res.reason, REASON_NO_MATCH);
    assert!(res.policies_applied.is_empty());
}

#[test]
fn higher_priority_rule_decides() {
    let ev = evaluator();

    let mut deny = NewTenantRule::new("t1", "deny_low");
    deny.configuration.priority = 1;
    deny.actions.action_type = RuleActionType::Deny;
    deny.actions.message = Some("low says no".into());
    ev.store().create_rule(deny).unwrap();

    let mut allow = NewTenantRule::new("t1", "allow_high");
    allow.configuration.priority = 9;
    allow.actions.action_type = RuleActionType::Allow;
    allow.actions.message = Some("high says yes".into());
    let high = ev.store().create_rule(allow).unwrap();

    let ctx = TenantSecurityContext::new("t1", "u1");
    let res = ev.evaluate_access_at(&ctx, &select_invoices(), monday_noon());
    assert!(res.allowed);
    assert_eq!(res.reason, "high says yes");
    assert_eq!(res.rules_evaluated, vec![high.id]);
}

#[test]
fn stop_on_match_halts_even_without_a_match() {
    let ev = evaluator();

    // Highest priority, never matches (other role), stops the loop.
    let mut gate = NewTenantRule::new("t1", "gate");
    gate.configuration.priority = 10;
    gate.configuration.stop_on_match = true;
    gate.conditions.data.table_name = Some("payroll".into());
    let gate = ev.store().create_rule(gate).unwrap();

    // Would deny if reached.
    let mut deny = NewTenantRule::new("t1", "deny_all");
    deny.configuration.priority = 1;
    deny.actions.action_type = RuleActionType::Deny;
    ev.store().create_rule(deny).unwrap();

    ev.store().create_policy(invoices_policy("t1")).unwrap();

    let ctx = TenantSecurityContext::new("t1", "u1");
    let res = ev.evaluate_access_at(&ctx, &select_invoices(), monday_noon());
    assert!(res.allowed, "deny rule must not be reached: {}", res.reason);
    assert_eq!(res.rules_evaluated, vec![gate.id]);
}

#[test]
fn rules_for_other_roles_are_not_evaluated() {
    let ev = evaluator();
    let mut admin_deny = NewTenantRule::new("t1", "admin_deny");
    admin_deny.actions.action_type = RuleActionType::Deny;
    admin_deny.conditions.context = ContextConditions {
        role: Some("admin".into()),
        ..Default::default()
    };
    ev.store().create_rule(admin_deny).unwrap();

    let ctx = TenantSecurityContext::new("t1", "u1");
    let res = ev.evaluate_access_at(&ctx, &select_invoices(), monday_noon());
    assert!(res.rules_evaluated.is_empty());
}

#[test]
fn adding_a_role_policy_flips_deny_to_allow() {
    let ev = evaluator();
    let ctx = TenantSecurityContext::new("t1", "u1").with_role("viewer");
    let op = Operation::new(OperationType::Update, "reports");
    assert!(!ev.evaluate_access_at(&ctx, &op, monday_noon()).allowed);

    let mut p = NewTenantPolicy::new("t1", "reports", "viewers");
    p.access_rules.roles = Some(vec!["viewer".into()]);
    ev.store().create_policy(p).unwrap();

    assert!(ev.evaluate_access_at(&ctx, &op, monday_noon()).allowed);
}

#[test]
fn time_restricted_policy_is_not_selectable_outside_window() {
    let ev = evaluator();
    let mut p = invoices_policy("t1");
    p.access_rules.time_restrictions = Some(TimeRestrictions {
        start_time: Some("08:00".into()),
        end_time: Some("10:00".into()),
        days_of_week: None,
    });
    ev.store().create_policy(p).unwrap();

    let ctx = TenantSecurityContext::new("t1", "u1");
    let res = ev.evaluate_access_at(&ctx, &select_invoices(), monday_noon());
    assert!(!res.allowed);
    assert_eq!(res.policies_applied.len(), 1);

    let morning = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(9, 30, 0).unwrap();
    assert!(ev.evaluate_access_at(&ctx, &select_invoices(), morning).allowed);
}

#[test]
fn weekend_only_policy_is_not_selectable_on_monday() {
    let ev = evaluator();
    let mut p = invoices_policy("t1");
    p.access_rules.time_restrictions = Some(TimeRestrictions {
        days_of_week: Some(vec![0, 6]),
        ..Default::default()
    });
    ev.store().create_policy(p).unwrap();

    let ctx = TenantSecurityContext::new("t1", "u1");
    assert!(!ev.evaluate_access_at(&ctx, &select_invoices(), monday_noon()).allowed);
}

#[test]
fn blocked_ip_is_not_selectable() {
    let ev = evaluator();
    let mut p = invoices_policy("t1");
    p.access_rules.ip_restrictions = Some(IpRestrictions {
        allowed_ips: None,
        blocked_ips: Some(vec!["198.51.100.4".into()]),
    });
    ev.store().create_policy(p).unwrap();

    let blocked = TenantSecurityContext::new("t1", "u1").with_ip("198.51.100.4");
    let other = TenantSecurityContext::new("t1", "u1").with_ip("198.51.100.5");
    assert!(!ev.evaluate_access_at(&blocked, &select_invoices(), monday_noon()).allowed);
    assert!(ev.evaluate_access_at(&other, &select_invoices(), monday_noon()).allowed);
}

#[test]
fn lower_priority_policy_applies_when_higher_fails() {
    let ev = evaluator();
    let mut strict = invoices_policy("t1");
    strict.policy_name = "admins_only".into();
    strict.access_rules.roles = Some(vec!["admin".into()]);
    let strict = ev.store().create_policy(strict).unwrap();

    let mut open = invoices_policy("t1");
    open.policy_name = "everyone".into();
    open.configuration.priority = 1;
    open.configuration.enforce_tenant_isolation = false;
    open.access_rules.roles = None;
    let open = ev.store().create_policy(open).unwrap();

    let ctx = TenantSecurityContext::new("t1", "u1");
    let res = ev.evaluate_access_at(&ctx, &select_invoices(), monday_noon());
    assert!(res.allowed);
    assert!(!res.tenant_isolation_enforced);
    assert_eq!(res.policies_applied, vec![strict.id, open.id]);
}

#[test]
fn reads_are_idempotent() {
    let store = PolicyStore::new();
    defaults::seed(&store);
    for prio in [3, 3, 7, 3] {
        let mut p = invoices_policy("default");
        p.configuration.priority = prio;
        store.create_policy(p).unwrap();
        let mut r = NewTenantRule::new("default", "r");
        r.configuration.priority = prio;
        store.create_rule(r).unwrap();
    }

    let f = PolicyFilter {
        table_name: Some("invoices".into()),
        ..Default::default()
    };
    let a: Vec<_> = store.tenant_policies("default", &f).into_iter().map(|p| p.id).collect();
    let b: Vec<_> = store.tenant_policies("default", &f).into_iter().map(|p| p.id).collect();
    assert_eq!(a, b);
    assert_eq!(a.len(), 5);

    let ra: Vec<_> = store.tenant_rules("default", &RuleFilter::default()).into_iter().map(|r| r.id).collect();
    let rb: Vec<_> = store.tenant_rules("default", &RuleFilter::default()).into_iter().map(|r| r.id).collect();
    assert_eq!(ra, rb);
}

#[test]
fn seeded_rule_stops_rule_iteration_and_policy_decides() {
    let store = Arc::new(PolicyStore::new());
    defaults::seed(&store);
    let ev = AccessEvaluator::new(Arc::clone(&store), ClockSource::Utc);

    // The seeded policy only admits the literal tenant "current_tenant".
    let ctx = TenantSecurityContext::new("default", "u1").with_role("user");
    let res = ev.evaluate_access_at(&ctx, &select_invoices(), monday_noon());
    assert!(!res.allowed);
    assert_eq!(res.rules_evaluated, vec!["tenant_rule_1"]);
    assert_eq!(res.policies_applied, vec!["tenant_policy_1"]);
    assert!(!res.tenant_isolation_enforced);
}

#[test]
fn seeded_cross_tenant_policy_opens_select_across_tenants() {
    let store = Arc::new(PolicyStore::new());
    defaults::seed(&store);
    let ev = AccessEvaluator::new(Arc::clone(&store), ClockSource::Utc);

    let ctx = TenantSecurityContext::new("default", "u1").with_role("admin");
    let select = Operation::new(OperationType::Select, "organizations").with_target_tenant("t9");
    let delete = Operation::new(OperationType::Delete, "organizations").with_target_tenant("t9");

    let res = ev.evaluate_access_at(&ctx, &select, monday_noon());
    assert!(res.allowed);
    assert_eq!(res.reason, "allowed by tenant policy cross_tenant_admin_access");
    assert!(!res.tenant_isolation_enforced);

    let res = ev.evaluate_access_at(&ctx, &delete, monday_noon());
    assert_eq!(res.reason, REASON_CROSS_TENANT);
}
