//! Request handlers.

use axum::{
    extract::State,
    response::{Html, Json},
};
use serde_json::json;

use super::error::{ApiError, ApiResult};
use super::view;
use super::AppState;
use crate::snapshot::VitalsSnapshot;

/// Run one read cycle on the blocking pool.
async fn read(state: &AppState) -> ApiResult<VitalsSnapshot> {
    let monitor = state.monitor.clone();
    let busy = state.busy_policy;
    let snapshot = tokio::task::spawn_blocking(move || monitor.read_snapshot(busy))
        .await
        .map_err(|e| ApiError::internal(format!("read task failed: {e}")))??;
    Ok(snapshot)
}

pub async fn api_data(State(state): State<AppState>) -> ApiResult<Json<VitalsSnapshot>> {
    Ok(Json(read(&state).await?))
}

pub async fn index(State(state): State<AppState>) -> ApiResult<Html<String>> {
    let snapshot = read(&state).await?;
    Ok(Html(view::render_dashboard(&snapshot)))
}

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let monitor = &state.monitor;
    let stats = monitor.stats();
    Json(json!({
        "status": "ok",
        "source": monitor.source(),
        "strategy": monitor.strategy().name(),
        "alert_policy": monitor.alert_policy().name(),
        "busy_policy": state.busy_policy,
        "cycles": stats.cycles,
        "failures": stats.failures,
        "in_flight": stats.in_flight,
        "last_error": stats.last_error,
        "uptime_secs": state.started.elapsed().as_secs(),
    }))
}
