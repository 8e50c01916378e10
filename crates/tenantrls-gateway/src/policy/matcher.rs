//! Rule and policy matching predicates.
//!
//! Both predicates are conjunctions of optional constraints: an unset
//! constraint never excludes, a set one must hold.

use chrono::{Datelike, NaiveDateTime, Timelike};

use tenantrls_core::model::{
    IpRestrictions, Operation, TenantPolicy, TenantRule, TenantSecurityContext, TimeOfDay,
    TimeRestrictions,
};

/// Present and non-empty; an empty string constrains nothing.
pub fn condition(v: &Option<String>) -> Option<&str> {
    v.as_deref().filter(|s| !s.is_empty())
}

/// Rule conditions against the caller context and the requested operation.
pub fn rule_matches(rule: &TenantRule, ctx: &TenantSecurityContext, op: &Operation) -> bool {
    let c = &rule.conditions.context;
    if condition(&c.tenant_id).is_some_and(|t| t != ctx.tenant_id) {
        return false;
    }
    if condition(&c.role).is_some_and(|r| r != ctx.role) {
        return false;
    }
    if let Some(perms) = &c.permissions {
        if !ctx.has_all_permissions(perms) {
            return false;
        }
    }

    let d = &rule.conditions.data;
    // Compared as plain strings: a rule scoped to "ALL" matches no concrete operation.
    if condition(&d.operation).is_some_and(|o| o != op.op_type.as_str()) {
        return false;
    }
    if condition(&d.table_name).is_some_and(|t| t != op.table_name) {
        return false;
    }
    if condition(&d.tenant_id).is_some_and(|t| t != ctx.tenant_id) {
        return false;
    }
    true
}

/// Policy access rules against the caller context at wall-clock `now`.
pub fn policy_matches(policy: &TenantPolicy, ctx: &TenantSecurityContext, now: NaiveDateTime) -> bool {
    let ar = &policy.access_rules;

    if let Some(roles) = &ar.roles {
        if !roles.iter().any(|r| *r == ctx.role) {
            return false;
        }
    }

    if let Some(tr) = &ar.tenant_restrictions {
        if tr.blocked_tenants.as_ref().is_some_and(|b| b.contains(&ctx.tenant_id)) {
            return false;
        }
        if tr.allowed_tenants.as_ref().is_some_and(|a| !a.contains(&ctx.tenant_id)) {
            return false;
        }
    }

    if let Some(tr) = &ar.time_restrictions {
        if !within_time_window(tr, now) {
            return false;
        }
    }

    if let Some(ip) = &ar.ip_restrictions {
        if !ip_admitted(ip, &ctx.ip_address) {
            return false;
        }
    }

    true
}

/// Inclusive `[startTime, endTime]` at minute resolution, plus day-of-week
/// (0 = Sunday). An unparseable bound never admits.
pub fn within_time_window(tr: &TimeRestrictions, now: NaiveDateTime) -> bool {
    let current = TimeOfDay::new(now.hour(), now.minute());

    if let Some(start) = &tr.start_time {
        match TimeOfDay::parse(start) {
            Some(s) if current >= s => {}
            _ => return false,
        }
    }
    if let Some(end) = &tr.end_time {
        match TimeOfDay::parse(end) {
            Some(e) if current <= e => {}
            _ => return false,
        }
    }
    if let Some(days) = &tr.days_of_week {
        let today = now.weekday().num_days_from_sunday();
        if !days.iter().any(|d| u32::from(*d) == today) {
            return false;
        }
    }
    true
}

pub fn ip_admitted(ip: &IpRestrictions, addr: &str) -> bool {
    if ip.blocked_ips.as_ref().is_some_and(|b| b.iter().any(|x| x == addr)) {
        return false;
    }
    if ip.allowed_ips.as_ref().is_some_and(|a| !a.iter().any(|x| x == addr)) {
        return false;
    }
    true
}
