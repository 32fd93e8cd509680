pub mod auth;
pub mod errors;
pub mod models;
pub mod routes;

use std::sync::Arc;
use std::time::Instant;
use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use crate::jobs::{JobOrchestrator, JobStore};

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: JobOrchestrator,
    pub api_token: Option<Arc<str>>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(orchestrator: JobOrchestrator, api_token: Option<String>) -> Self {
        Self {
            orchestrator,
            api_token: api_token.filter(|t| !t.is_empty()).map(Arc::from),
            started_at: Instant::now(),
        }
    }

    pub fn jobs(&self) -> &JobStore {
        self.orchestrator.store()
    }
}

pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/live-search", post(routes::search::start_live_search))
        .route("/api/jobs", get(routes::jobs::list_jobs))
        .route("/api/jobs/{id}/status", get(routes::jobs::get_status))
        .route("/api/jobs/{id}/logs", get(routes::jobs::get_logs))
        .route("/api/jobs/{id}/cancel", post(routes::jobs::cancel_job))
        .route_layer(axum::middleware::from_fn_with_state(state.clone(), auth::api_auth_middleware));

    Router::new()
        .route("/api/health", get(routes::health::health_check))
        .merge(protected)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
