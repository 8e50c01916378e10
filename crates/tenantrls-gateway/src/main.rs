//! Tenant RLS policy engine server.
//!
//! Config path: first CLI argument, else `TENANTRLS_CONFIG`, else
//! `tenantrls.yaml`.

use std::net::SocketAddr;
use std::process::ExitCode;

use tracing_subscriber::{fmt, EnvFilter};

use tenantrls_gateway::{app_state, config, router};

#[tokio::main]
async fn main() -> ExitCode {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("TENANTRLS_CONFIG").ok())
        .unwrap_or_else(|| config::DEFAULT_CONFIG_PATH.to_string());

    let cfg = match config::load_from_file(&path) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(%path, error = %e, "config load failed");
            return ExitCode::FAILURE;
        }
    };

    let listen: SocketAddr = match cfg.gateway.listen.parse() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!(listen = %cfg.gateway.listen, error = %e, "gateway.listen must be a valid socket address");
            return ExitCode::FAILURE;
        }
    };

    let state = match app_state::AppState::new(cfg) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!(error = %e, "state init failed");
            return ExitCode::FAILURE;
        }
    };
    let app = router::build_router(state);

    let listener = match tokio::net::TcpListener::bind(listen).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(%listen, error = %e, "bind failed");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(%listen, "tenantrls-gateway starting");
    if let Err(e) = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await {
        tracing::error!(error = %e, "server failed");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
