use axum::response::IntoResponse;
use chrono::Utc;
use serde_json::json;

use super::envelope::ok;

/// Static capability descriptor.
pub async fn health() -> impl IntoResponse {
    ok(json!({
        "service": "rls-tenant-policies",
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now(),
        "features": [
            "tenant_isolation",
            "tenant_rules",
            "cross_tenant_access",
            "time_restrictions",
            "ip_restrictions",
            "policy_generation",
            "audit_logging",
            "tenant_stats"
        ]
    }))
}
