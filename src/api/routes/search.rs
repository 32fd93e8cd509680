use axum::{extract::State, http::StatusCode, Json};
use tracing::info;
use crate::api::models::{LiveSearchRequest, LiveSearchResponse};
use crate::api::AppState;
use crate::errors::ScoutError;
use crate::models::Source;

/// Accept a search and return its job id immediately; scraping runs in the background.
pub async fn start_live_search(
    State(state): State<AppState>,
    Json(req): Json<LiveSearchRequest>,
) -> Result<(StatusCode, Json<LiveSearchResponse>), ScoutError> {
    let sources = Source::parse_list(&req.sources)?;
    let query = req.query();
    if query.is_empty() {
        return Err(ScoutError::InvalidRequest("a search query or session reference is required".into()));
    }

    let count = sources.len();
    let job_id = state.orchestrator.start_job(&query, sources)?;
    info!(job_id = %job_id, session_ref = %req.session_ref, "Live search accepted");

    Ok((
        StatusCode::ACCEPTED,
        Json(LiveSearchResponse {
            message: format!("Searching {} source(s) for \"{}\"", count, query),
            job_id,
            query,
            sources: req.requested_sources(),
        }),
    ))
}
