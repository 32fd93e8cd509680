use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use crate::api::AppState;
use crate::errors::ScoutError;
use crate::jobs::JobStatusView;

pub async fn get_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobStatusView>, ScoutError> {
    state.jobs()
        .snapshot(&id)
        .map(|job| Json(job.status_view()))
        .ok_or(ScoutError::JobNotFound(id))
}

pub async fn get_logs(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ScoutError> {
    let logs = state.jobs().logs(&id).ok_or(ScoutError::JobNotFound(id))?;
    Ok(Json(json!({ "logs": logs })))
}

pub async fn cancel_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ScoutError> {
    let cancelled = state.jobs().cancel(&id)?;
    Ok(Json(json!({ "id": id, "cancelled": cancelled })))
}

pub async fn list_jobs(State(state): State<AppState>) -> Json<Value> {
    let jobs = state.jobs().list();
    Json(json!({ "total": jobs.len(), "jobs": jobs }))
}
