//! Tenant guard middleware in front of a stub data route.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    routing::get,
    Extension, Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use tenantrls_core::model::{NewTenantPolicy, TenantSecurityContext};
use tenantrls_gateway::{
    app_state::AppState,
    config::{EngineConfig, TableConfig},
    middleware::tenant_guard::{H_POLICIES_APPLIED, H_RULES_EVALUATED, H_TENANT_ISOLATION},
    router::guard_table,
};

fn state_with(tables: Vec<TableConfig>) -> AppState {
    let cfg = EngineConfig {
        seed_defaults: false,
        tables,
        ..EngineConfig::default()
    };
    let st = AppState::new(cfg).unwrap();

    let mut p = NewTenantPolicy::new("t1", "invoices", "members");
    p.configuration.priority = 5;
    p.access_rules.roles = Some(vec!["user".into(), "admin".into()]);
    st.store().create_policy(p).unwrap();
    st
}

async fn echo(Json(body): Json<Value>) -> Json<Value> {
    Json(json!({ "success": true, "data": body }))
}

async fn list() -> Json<Value> {
    Json(json!({ "success": true, "data": [
        { "id": 1, "tenantId": "t1", "organizationId": "o1" },
        { "id": 2, "tenantId": "t2", "organizationId": "o2" },
        { "id": 3 }
    ]}))
}

async fn foreign() -> Json<Value> {
    Json(json!({ "success": true, "data": { "id": 2, "tenantId": "t2" } }))
}

async fn whoami(Extension(ctx): Extension<TenantSecurityContext>) -> Json<Value> {
    Json(json!({ "success": true, "data": { "tenantId": ctx.tenant_id, "sessionId": ctx.session_id } }))
}

fn app(st: &AppState) -> Router {
    let routes = Router::new()
        .route("/invoices", get(list).post(echo).put(echo))
        .route("/invoices/foreign", get(foreign))
        .route("/invoices/me", get(whoami));
    guard_table(routes, st, "invoices")
}

fn request(method: &str, uri: &str, role: &str, body: Option<Value>) -> Request<Body> {
    let b = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-tenant-id", "t1")
        .header("x-user-id", "u1")
        .header("x-organization-id", "o1")
        .header("x-user-role", role);
    match body {
        Some(v) => b
            .header("content-type", "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => b.body(Body::empty()).unwrap(),
    }
}

async fn json_body(resp: axum::response::Response) -> Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn missing_identity_headers_are_rejected() {
    let st = state_with(vec![]);
    let req = Request::builder().uri("/invoices").body(Body::empty()).unwrap();
    let resp = app(&st).oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = json_body(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["details"]["fields"], json!(["x-tenant-id", "x-user-id"]));
    assert!(st.audit().is_empty());
}

#[tokio::test]
async fn denied_request_gets_403_with_evidence() {
    let st = state_with(vec![]);
    let resp = app(&st).oneshot(request("GET", "/invoices", "viewer", None)).await.unwrap();

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(resp.headers()[H_TENANT_ISOLATION], "false");
    let body = json_body(resp).await;
    assert_eq!(body["error"], "access denied");
    assert_eq!(body["message"], "no tenant policy or rule permits access");
    assert_eq!(body["details"]["policiesApplied"].as_array().unwrap().len(), 1);
    assert_eq!(st.audit().len(), 1);
    assert_eq!(
        st.metrics().middleware_rejections.get(&[("reason", "denied")]),
        1
    );
}

#[tokio::test]
async fn cross_tenant_header_is_denied() {
    let st = state_with(vec![]);
    let mut req = request("GET", "/invoices", "user", None);
    req.headers_mut().insert("x-target-tenant-id", "t2".parse().unwrap());
    let resp = app(&st).oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(resp.headers()[H_TENANT_ISOLATION], "true");
    assert_eq!(resp.headers()[H_POLICIES_APPLIED], "");
    let body = json_body(resp).await;
    assert_eq!(body["message"], "cross-tenant access not permitted");
}

#[tokio::test]
async fn allowed_list_loses_foreign_records() {
    let st = state_with(vec![]);
    let resp = app(&st).oneshot(request("GET", "/invoices", "user", None)).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[H_TENANT_ISOLATION], "true");
    assert_eq!(resp.headers()[H_RULES_EVALUATED], "");
    assert!(resp.headers()[H_POLICIES_APPLIED]
        .to_str()
        .unwrap()
        .starts_with("tenant_policy_"));

    let body = json_body(resp).await;
    let ids: Vec<_> = body["data"].as_array().unwrap().iter().map(|r| r["id"].clone()).collect();
    assert_eq!(ids, vec![json!(1), json!(3)]);
}

#[tokio::test]
async fn single_foreign_record_is_blocked() {
    let st = state_with(vec![]);
    let resp = app(&st)
        .oneshot(request("GET", "/invoices/foreign", "user", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body = json_body(resp).await;
    assert_eq!(body["message"], "record belongs to another tenant");
}

#[tokio::test]
async fn filtering_can_be_switched_off_per_table() {
    let mut table = TableConfig::new("invoices");
    table.filter_responses = false;
    let st = state_with(vec![table]);

    let resp = app(&st).oneshot(request("GET", "/invoices", "user", None)).await.unwrap();
    let body = json_body(resp).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn insert_body_is_stamped_with_caller_identity() {
    let st = state_with(vec![]);
    let resp = app(&st)
        .oneshot(request(
            "POST",
            "/invoices",
            "user",
            Some(json!({ "amount": 12, "tenantId": "t2", "organizationId": "o2" })),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["data"]["tenantId"], "t1");
    assert_eq!(body["data"]["organizationId"], "o1");
    assert_eq!(body["data"]["createdBy"], "u1");
    assert_eq!(body["data"]["amount"], 12);
}

#[tokio::test]
async fn update_body_is_stamped_without_creator() {
    let st = state_with(vec![]);
    let resp = app(&st)
        .oneshot(request("PUT", "/invoices", "user", Some(json!({ "amount": 3 }))))
        .await
        .unwrap();

    let body = json_body(resp).await;
    assert_eq!(body["data"]["tenantId"], "t1");
    assert!(body["data"].get("createdBy").is_none());
}

#[tokio::test]
async fn handler_sees_registered_context() {
    let st = state_with(vec![]);
    let mut req = request("GET", "/invoices/me", "user", None);
    req.headers_mut().insert("x-session-id", "sess-7".parse().unwrap());
    let resp = app(&st).oneshot(req).await.unwrap();

    let body = json_body(resp).await;
    assert_eq!(body["data"]["tenantId"], "t1");
    assert_eq!(body["data"]["sessionId"], "sess-7");
    assert!(st.contexts().get_context("sess-7").is_some());
}

#[tokio::test]
async fn unmapped_method_is_not_allowed() {
    let st = state_with(vec![]);
    let resp = app(&st)
        .oneshot(request("OPTIONS", "/invoices", "user", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert!(st.audit().is_empty());
}
