use std::net::IpAddr;

use axum::http::HeaderMap;
use serde::de::DeserializeOwned;

use tenantrls_core::error::{Result, TenantRlsError};
use tenantrls_core::model::{SubscriptionLevel, TenantMetadata, TenantSecurityContext};

use crate::id;

pub const H_TENANT_ID: &str = "x-tenant-id";
pub const H_ORGANIZATION_ID: &str = "x-organization-id";
pub const H_USER_ID: &str = "x-user-id";
pub const H_USER_ROLE: &str = "x-user-role";
pub const H_PERMISSIONS: &str = "x-permissions";
pub const H_SESSION_ID: &str = "x-session-id";
pub const H_REQUEST_ID: &str = "x-request-id";
pub const H_TENANT_TYPE: &str = "x-tenant-type";
pub const H_SUBSCRIPTION_LEVEL: &str = "x-subscription-level";
pub const H_DATA_RETENTION_DAYS: &str = "x-data-retention-days";
pub const H_COMPLIANCE: &str = "x-compliance-requirements";
pub const H_TARGET_TENANT_ID: &str = "x-target-tenant-id";
pub const H_FORWARDED_FOR: &str = "x-forwarded-for";

const DEFAULT_RETENTION_DAYS: u32 = 90;

/// Non-empty, trimmed header value.
pub fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn comma_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_enum<T: DeserializeOwned>(name: &str, raw: &str) -> Result<T> {
    serde_json::from_value(serde_json::Value::from(raw))
        .map_err(|_| TenantRlsError::BadRequest(format!("invalid {name}: {raw}")))
}

/// Client address: first `x-forwarded-for` hop, else the peer address.
pub fn client_ip(headers: &HeaderMap, peer: Option<IpAddr>) -> String {
    header(headers, H_FORWARDED_FOR)
        .and_then(|v| v.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| peer.map(|ip| ip.to_string()))
        .unwrap_or_else(|| "unknown".into())
}

/// Build the request's security context from `x-*` headers.
///
/// Identity is taken from the headers as sent; nothing here verifies it.
pub fn context_from_headers(headers: &HeaderMap, peer: Option<IpAddr>) -> Result<TenantSecurityContext> {
    let tenant_id = header(headers, H_TENANT_ID);
    let user_id = header(headers, H_USER_ID);
    let (tenant_id, user_id) = match (tenant_id, user_id) {
        (Some(t), Some(u)) => (t, u),
        (t, u) => {
            let missing = [(H_TENANT_ID, t), (H_USER_ID, u)]
                .into_iter()
                .filter(|(_, v)| v.is_none())
                .map(|(k, _)| k);
            return Err(TenantRlsError::missing(missing));
        }
    };

    let mut ctx = TenantSecurityContext::new(tenant_id, user_id).with_ip(client_ip(headers, peer));

    if let Some(org) = header(headers, H_ORGANIZATION_ID) {
        ctx = ctx.with_organization(org);
    }
    if let Some(role) = header(headers, H_USER_ROLE) {
        ctx = ctx.with_role(role);
    }
    if let Some(perms) = header(headers, H_PERMISSIONS) {
        let perms = comma_list(perms);
        if !perms.is_empty() {
            ctx = ctx.with_permissions(perms);
        }
    }
    ctx.session_id = header(headers, H_SESSION_ID)
        .map(str::to_string)
        .unwrap_or_else(|| id::generate("session"));
    if let Some(ua) = header(headers, axum::http::header::USER_AGENT.as_str()) {
        ctx.user_agent = ua.to_string();
    }

    ctx.tenant_metadata = tenant_metadata(headers)?;
    Ok(ctx)
}

/// Present only when `x-tenant-type` is sent.
fn tenant_metadata(headers: &HeaderMap) -> Result<Option<TenantMetadata>> {
    let Some(tenant_type) = header(headers, H_TENANT_TYPE) else {
        return Ok(None);
    };

    let subscription_level = match header(headers, H_SUBSCRIPTION_LEVEL) {
        Some(raw) => parse_enum(H_SUBSCRIPTION_LEVEL, raw)?,
        None => SubscriptionLevel::Basic,
    };
    let data_retention_days = match header(headers, H_DATA_RETENTION_DAYS) {
        Some(raw) => raw.parse().map_err(|_| {
            TenantRlsError::BadRequest(format!("invalid {H_DATA_RETENTION_DAYS}: {raw}"))
        })?,
        None => DEFAULT_RETENTION_DAYS,
    };

    Ok(Some(TenantMetadata {
        tenant_type: parse_enum(H_TENANT_TYPE, tenant_type)?,
        subscription_level,
        data_retention_days,
        compliance_requirements: header(headers, H_COMPLIANCE).map(comma_list).unwrap_or_default(),
    }))
}

/// Request id header, else a generated session-style token.
pub fn request_id(headers: &HeaderMap) -> String {
    header(headers, H_REQUEST_ID)
        .map(str::to_string)
        .unwrap_or_else(|| id::generate("session"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use tenantrls_core::error::ClientCode;
    use tenantrls_core::model::TenantType;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut h = HeaderMap::new();
        for (k, v) in pairs {
            h.insert(*k, HeaderValue::from_static(v));
        }
        h
    }

    #[test]
    fn defaults_fill_missing_headers() {
        let ctx = context_from_headers(&headers(&[(H_TENANT_ID, "t1"), (H_USER_ID, "u1")]), None).unwrap();
        assert_eq!(ctx.organization_id, "default");
        assert_eq!(ctx.role, "user");
        assert!(ctx.has_permission("read"));
        assert_eq!(ctx.permissions.len(), 1);
        assert!(ctx.session_id.starts_with("session_"));
        assert_eq!(ctx.ip_address, "unknown");
        assert!(ctx.tenant_metadata.is_none());
    }

    #[test]
    fn explicit_headers_win() {
        let h = headers(&[
            (H_TENANT_ID, "t1"),
            (H_USER_ID, "u1"),
            (H_ORGANIZATION_ID, "org-9"),
            (H_USER_ROLE, "admin"),
            (H_PERMISSIONS, "read, write ,cross_tenant_access"),
            (H_SESSION_ID, "s-42"),
            (H_FORWARDED_FOR, "203.0.113.7, 10.0.0.1"),
        ]);
        let ctx = context_from_headers(&h, Some("127.0.0.1".parse().unwrap())).unwrap();
        assert_eq!(ctx.organization_id, "org-9");
        assert!(ctx.can_cross_tenants());
        assert!(ctx.has_permission("write"));
        assert_eq!(ctx.session_id, "s-42");
        assert_eq!(ctx.ip_address, "203.0.113.7");
    }

    #[test]
    fn peer_address_used_without_forwarding() {
        let ctx = context_from_headers(
            &headers(&[(H_TENANT_ID, "t1"), (H_USER_ID, "u1")]),
            Some("192.0.2.1".parse().unwrap()),
        )
        .unwrap();
        assert_eq!(ctx.ip_address, "192.0.2.1");
    }

    #[test]
    fn missing_identity_lists_fields() {
        let err = context_from_headers(&headers(&[(H_USER_ID, "u1")]), None).unwrap_err();
        assert_eq!(err.client_code(), ClientCode::ValidationFailed);
        match err {
            TenantRlsError::Validation { fields } => assert_eq!(fields, vec![H_TENANT_ID]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn tenant_metadata_from_headers() {
        let h = headers(&[
            (H_TENANT_ID, "t1"),
            (H_USER_ID, "u1"),
            (H_TENANT_TYPE, "small_business"),
            (H_COMPLIANCE, "gdpr,pci"),
        ]);
        let meta = context_from_headers(&h, None).unwrap().tenant_metadata.unwrap();
        assert_eq!(meta.tenant_type, TenantType::SmallBusiness);
        assert_eq!(meta.subscription_level, SubscriptionLevel::Basic);
        assert_eq!(meta.data_retention_days, 90);
        assert_eq!(meta.compliance_requirements, vec!["gdpr", "pci"]);
    }

    #[test]
    fn invalid_metadata_is_rejected() {
        let h = headers(&[
            (H_TENANT_ID, "t1"),
            (H_USER_ID, "u1"),
            (H_TENANT_TYPE, "enterprise"),
            (H_DATA_RETENTION_DAYS, "forever"),
        ]);
        let err = context_from_headers(&h, None).unwrap_err();
        assert_eq!(err.client_code(), ClientCode::BadRequest);
    }
}
