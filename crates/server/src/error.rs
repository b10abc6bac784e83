//! The HTTP boundary error type (§7, §10.2) — wraps the lower crates'
//! errors with `#[from]` and maps each to a status code and a JSON
//! `ErrorResponse { error, details }` body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use warden_cache::CacheError;
use warden_db::DbError;
use warden_tracker::TrackerError;

#[derive(Debug, Serialize, ToSchema)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into(), details: None }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self { error: error.into(), details: Some(details.into()) }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Tracker(#[from] TrackerError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::NotFound(what) => {
                tracing::warn!(what = %what, "not found");
                (StatusCode::NOT_FOUND, ErrorResponse::new(what.clone()))
            }
            ApiError::BadRequest(msg) => {
                tracing::warn!(message = %msg, "bad request");
                (StatusCode::BAD_REQUEST, ErrorResponse::new(msg.clone()))
            }
            ApiError::Cache(err) => {
                tracing::error!(error = %err, "cache error");
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorResponse::with_details("cache error", err.to_string()))
            }
            ApiError::Db(err) => {
                tracing::error!(error = %err, "database error");
                (StatusCode::SERVICE_UNAVAILABLE, ErrorResponse::with_details("database error", err.to_string()))
            }
            ApiError::Tracker(TrackerError::UnknownSession { id }) => {
                tracing::warn!(session_id = %id, "unknown tracker");
                (StatusCode::NOT_FOUND, ErrorResponse::with_details("unknown tracker", format!("session {id}")))
            }
            ApiError::Tracker(err) => {
                tracing::error!(error = %err, "tracker error");
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorResponse::with_details("tracker error", err.to_string()))
            }
        };

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn extract(response: Response) -> (StatusCode, ErrorResponse) {
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn not_found_returns_404() {
        let (status, body) = extract(ApiError::NotFound("session 7".into()).into_response()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error, "session 7");
    }

    #[tokio::test]
    async fn bad_request_returns_400() {
        let (status, _) = extract(ApiError::BadRequest("missing email".into()).into_response()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_tracker_returns_404() {
        let err = ApiError::Tracker(TrackerError::UnknownSession { id: 42 });
        let (status, body) = extract(err.into_response()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.details.unwrap().contains("42"));
    }

    #[test]
    fn error_response_serialization_skips_none_details() {
        let json = serde_json::to_string(&ErrorResponse::new("x")).unwrap();
        assert!(!json.contains("details"));
        let json = serde_json::to_string(&ErrorResponse::with_details("x", "y")).unwrap();
        assert!(json.contains("\"details\":\"y\""));
    }
}
