//! Request logging middleware.

use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};

use crate::context::tenant::{header, H_TENANT_ID};

pub async fn logging(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let tenant_id = header(request.headers(), H_TENANT_ID).unwrap_or("-").to_string();

    let response = next.run(request).await;

    let status = response.status();
    let latency_us = start.elapsed().as_micros() as u64;
    if status.is_server_error() {
        tracing::error!(%method, %uri, %status, latency_us, %tenant_id, "request failed");
    } else {
        tracing::info!(%method, %uri, %status, latency_us, %tenant_id, "request complete");
    }

    response
}
