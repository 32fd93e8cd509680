use axum::{extract::State, Json};
use serde_json::{json, Value};
use crate::api::AppState;

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "scout",
        "version": env!("CARGO_PKG_VERSION"),
        "build": option_env!("GIT_HASH").unwrap_or("unknown"),
        "builtAt": option_env!("BUILD_TIMESTAMP").unwrap_or("unknown"),
        "uptimeSecs": state.started_at.elapsed().as_secs(),
        "jobs": state.jobs().len(),
    }))
}
