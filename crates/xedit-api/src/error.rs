//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use xedit_media::MediaError;
use xedit_predictor::PredictError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("Prediction error: {0}")]
    Predict(#[from] PredictError),
}

impl ApiError {
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Media(MediaError::FileNotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Media(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::Media(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Predict(e) => match e {
                PredictError::FileNotFound(_) => StatusCode::NOT_FOUND,
                PredictError::ServiceBusy => StatusCode::SERVICE_UNAVAILABLE,
                PredictError::PollLimitExceeded(_) => StatusCode::GATEWAY_TIMEOUT,
                PredictError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
                PredictError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::BAD_GATEWAY,
            },
        }
    }

    fn code(&self) -> Option<&'static str> {
        match self {
            ApiError::Media(MediaError::FileNotFound(_)) | ApiError::Predict(PredictError::FileNotFound(_)) => {
                Some("not_found")
            }
            ApiError::Media(MediaError::InvalidFormat { .. }) => Some("invalid_format"),
            ApiError::Predict(PredictError::JobFailed(_)) => Some("job_failed"),
            ApiError::Predict(PredictError::ServiceBusy) => Some("service_busy"),
            ApiError::Predict(PredictError::Submission { .. }) => Some("submission_failed"),
            ApiError::Validation(_) => Some("validation"),
            _ => None,
        }
    }

    fn is_internal(&self) -> bool {
        self.status_code() == StatusCode::INTERNAL_SERVER_ERROR
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Don't expose internal error details in production
        let detail = match &self {
            _ if self.is_internal() && std::env::var("ENVIRONMENT").unwrap_or_default() == "production" => {
                "An internal error occurred".to_string()
            }
            ApiError::Media(e) => e.to_string(),
            ApiError::Predict(e) => e.user_message(),
            _ => self.to_string(),
        };

        let body = ErrorResponse {
            detail,
            code: self.code(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::from(PredictError::ServiceBusy).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::from(PredictError::JobFailed(None)).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::from(MediaError::invalid_format("a.gif", "gif")).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(MediaError::FileNotFound("a.png".into())).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(MediaError::internal("worker gone")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
