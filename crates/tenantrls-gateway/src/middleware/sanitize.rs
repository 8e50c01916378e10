//! Payload stamping and response filtering by tenant identity.

use serde_json::{Map, Value};

use tenantrls_core::model::{OperationType, TenantSecurityContext};

use crate::config::TableConfig;

/// Stamp tenant identity onto an inbound object or onto each object of an
/// array. Caller-supplied values are overwritten.
pub fn stamp_payload(body: &mut Value, ctx: &TenantSecurityContext, table: &TableConfig, op: OperationType) {
    match body {
        Value::Object(obj) => stamp_object(obj, ctx, table, op),
        Value::Array(items) => {
            for item in items.iter_mut() {
                if let Value::Object(obj) = item {
                    stamp_object(obj, ctx, table, op);
                }
            }
        }
        _ => {}
    }
}

fn stamp_object(obj: &mut Map<String, Value>, ctx: &TenantSecurityContext, table: &TableConfig, op: OperationType) {
    if table.stamp_tenant {
        obj.insert("tenantId".into(), Value::from(ctx.tenant_id.as_str()));
        obj.insert("organizationId".into(), Value::from(ctx.organization_id.as_str()));
    }
    if table.stamp_created_by && op == OperationType::Insert {
        obj.insert("createdBy".into(), Value::from(ctx.user_id.as_str()));
    }
}

/// A record belongs to another tenant when it names a different
/// `tenantId` or `organizationId`. Records naming neither are kept.
pub fn is_foreign(record: &Value, ctx: &TenantSecurityContext) -> bool {
    let differs = |key: &str, own: &str| {
        record
            .get(key)
            .and_then(Value::as_str)
            .is_some_and(|v| v != own)
    };
    differs("tenantId", &ctx.tenant_id) || differs("organizationId", &ctx.organization_id)
}

#[derive(Debug, PartialEq, Eq)]
pub enum FilterOutcome {
    /// Body unchanged.
    Untouched,
    /// Foreign records were removed from `data`.
    Stripped(usize),
    /// `data` is a single foreign record.
    Blocked,
}

/// Filter the envelope's `data` member in place.
pub fn filter_response(body: &mut Value, ctx: &TenantSecurityContext) -> FilterOutcome {
    let Some(data) = body.get_mut("data") else {
        return FilterOutcome::Untouched;
    };

    if let Some(items) = data.as_array_mut() {
        let before = items.len();
        items.retain(|r| !is_foreign(r, ctx));
        return match before - items.len() {
            0 => FilterOutcome::Untouched,
            n => FilterOutcome::Stripped(n),
        };
    }

    if data.is_object() && is_foreign(data, ctx) {
        FilterOutcome::Blocked
    } else {
        FilterOutcome::Untouched
    }
}
