//! Webhook error types and HTTP mappings.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Webhook-facing error type
#[derive(Debug, Error)]
pub enum HttpError {
    /// Malformed webhook payload
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Handler-internal failure; the webhook answers with the
    /// `{"status": "error"}` shape
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        tracing::error!("Webhook error: {}", self);
        (status, Json(json!({ "status": "error" }))).into_response()
    }
}

impl From<anyhow::Error> for HttpError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let response = HttpError::BadRequest("missing From".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = HttpError::Internal("boom".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
