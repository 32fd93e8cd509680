use axum::{http::StatusCode, response::IntoResponse, Json};
use crate::errors::ScoutError;
use super::models::ErrorResponse;

impl IntoResponse for ScoutError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            ScoutError::InvalidRequest(_) | ScoutError::Config(_) => StatusCode::BAD_REQUEST,
            ScoutError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ScoutError::JobNotFound(_) => StatusCode::NOT_FOUND,
            ScoutError::AlreadyRunning(_) => StatusCode::CONFLICT,
            ScoutError::RateLimit(_) => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(ErrorResponse { error: self.to_string() })).into_response()
    }
}
