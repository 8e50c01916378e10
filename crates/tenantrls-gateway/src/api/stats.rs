use axum::{
    extract::{Path, State},
    response::IntoResponse,
};

use crate::app_state::AppState;
use crate::audit::tenant_stats;

use super::envelope::ok;

pub async fn get_stats(State(state): State<AppState>, Path(tenant_id): Path<String>) -> impl IntoResponse {
    ok(tenant_stats(state.store(), state.audit(), &tenant_id))
}
