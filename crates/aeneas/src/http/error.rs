use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::error::Error;

/// Error type returned by HTTP handlers.
///
/// Wraps [`Error`] for everything the service reports and adds the failures
/// that only exist at the HTTP boundary. Renders as `{"error": ..., "code": ...}`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// An error from the report service or its store.
    #[error(transparent)]
    Service(#[from] Error),

    /// The request body could not be read.
    #[error("failed to read request body: {0}")]
    BodyRead(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// The status code and stable error code this error maps to.
    #[must_use]
    pub fn status(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Service(err) => match err {
                Error::PayloadTooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE"),
                Error::UnsupportedMediaType { .. } => {
                    (StatusCode::UNSUPPORTED_MEDIA_TYPE, "UNSUPPORTED_MEDIA_TYPE")
                }
                Error::MalformedJson { .. } => (StatusCode::BAD_REQUEST, "MALFORMED_JSON"),
                Error::MissingField { .. } => (StatusCode::BAD_REQUEST, "MISSING_FIELD"),
                Error::WrongFieldType { .. } => (StatusCode::BAD_REQUEST, "WRONG_FIELD_TYPE"),
                Error::InvalidTimestamp { .. } => (StatusCode::BAD_REQUEST, "INVALID_TIMESTAMP"),
                Error::NotAcceptable => (StatusCode::NOT_ACCEPTABLE, "NOT_ACCEPTABLE"),
                Error::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            },
            AppError::BodyRead(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status();

        let message = if status.is_server_error() {
            tracing::error!(error = %self, "Internal error");
            "An internal error occurred".to_string()
        } else {
            tracing::debug!(error = %self, code, "Rejected request");
            self.to_string()
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_missing_field_is_400_with_message() {
        let (status, json) =
            error_to_response(Error::MissingField { field: "product" }.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "MISSING_FIELD");
        assert_eq!(json["error"], "no product specified");
    }

    #[test]
    fn test_request_errors_map_to_client_statuses() {
        let cases: Vec<(Error, StatusCode)> = vec![
            (
                Error::PayloadTooLarge {
                    size: 101,
                    limit: 100,
                },
                StatusCode::PAYLOAD_TOO_LARGE,
            ),
            (
                Error::UnsupportedMediaType {
                    content_type: "text/plain".to_string(),
                },
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ),
            (Error::malformed_json("eof"), StatusCode::BAD_REQUEST),
            (
                Error::WrongFieldType { field: "version" },
                StatusCode::BAD_REQUEST,
            ),
            (
                Error::InvalidTimestamp {
                    value: "yesterday".to_string(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (Error::NotAcceptable, StatusCode::NOT_ACCEPTABLE),
            (Error::not_found(7), StatusCode::NOT_FOUND),
        ];

        for (err, expected) in cases {
            assert!(err.is_client_error());
            let (status, _) = AppError::from(err).status();
            assert_eq!(status, expected);
        }
    }

    #[tokio::test]
    async fn test_internal_errors_are_sanitized() {
        let (status, json) = error_to_response(Error::internal("lock poisoned").into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["code"], "INTERNAL_ERROR");
        assert_eq!(json["error"], "An internal error occurred");
    }

    #[tokio::test]
    async fn test_body_read_is_400() {
        let (status, json) = error_to_response(AppError::BodyRead("reset".to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "BAD_REQUEST");
    }
}
