use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Service-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Analyzer-level AI failures never reach this type: they are absorbed by the
/// analyzers' deterministic fallbacks.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("No job description cached for job {job_id}")]
    MissingJd { job_id: String },

    #[error("Publish error: {0}")]
    Publish(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable error name carried in `scoring.failed` events.
    pub fn name(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "ValidationError",
            AppError::MissingJd { .. } => "MissingJdError",
            AppError::Publish(_) => "PublishFailure",
            AppError::Internal(_) => "InternalError",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::MissingJd { .. } => (StatusCode::NOT_FOUND, "MISSING_JD", self.to_string()),
            AppError::Publish(msg) => {
                tracing::error!("Publish error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "PUBLISH_ERROR",
                    "Outcome event could not be delivered".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_bad_request() {
        let response = AppError::Validation("jobId is required".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_missing_jd_maps_to_not_found() {
        let err = AppError::MissingJd {
            job_id: "job-9".to_string(),
        };
        assert_eq!(err.name(), "MissingJdError");
        assert!(err.to_string().contains("job-9"));
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_publish_failure_is_bad_gateway() {
        let err = AppError::Publish("connection refused".to_string());
        assert_eq!(err.name(), "PublishFailure");
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }
}
