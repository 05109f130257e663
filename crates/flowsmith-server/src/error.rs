//! Server error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use flowsmith_sdk::SdkError;
use serde_json::json;
use thiserror::Error;

/// Server error type
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline service error
    #[error("Service error: {0}")]
    ServiceError(String),

    /// The generator could not be reached
    #[error("Generator unavailable: {0}")]
    GeneratorUnavailable(String),

    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    InternalError(String),

    /// Not found
    #[error("Not found: {0}")]
    NotFound(String),
}

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::ServiceError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::GeneratorUnavailable(_) => StatusCode::BAD_GATEWAY,
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_message = match self {
            ServerError::ServiceError(msg)
            | ServerError::GeneratorUnavailable(msg)
            | ServerError::InvalidRequest(msg)
            | ServerError::InternalError(msg)
            | ServerError::NotFound(msg) => msg,
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

impl From<SdkError> for ServerError {
    fn from(err: SdkError) -> Self {
        match err {
            SdkError::InvalidRequest(msg) => ServerError::InvalidRequest(msg),
            SdkError::ValidationError(e) => ServerError::InvalidRequest(e.to_string()),
            SdkError::GeneratorError(e) => ServerError::GeneratorUnavailable(e.to_string()),
            other => ServerError::ServiceError(other.to_string()),
        }
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::InternalError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowsmith_llm::LLMError;

    #[test]
    fn test_error_display() {
        let err = ServerError::ServiceError("render failed".to_string());
        assert_eq!(err.to_string(), "Service error: render failed");

        let err = ServerError::InvalidRequest("missing field".to_string());
        assert_eq!(err.to_string(), "Invalid request: missing field");
    }

    #[test]
    fn test_sdk_error_conversion() {
        let err: ServerError = SdkError::InvalidRequest("empty query".to_string()).into();
        assert!(matches!(err, ServerError::InvalidRequest(_)));

        let err: ServerError = SdkError::from(LLMError::Transport("timeout".to_string())).into();
        assert!(matches!(err, ServerError::GeneratorUnavailable(_)));
        assert!(err.to_string().contains("timeout"));

        let err: ServerError = SdkError::CatalogError("bad file".to_string()).into();
        assert!(matches!(err, ServerError::ServiceError(_)));
    }

    #[test]
    fn test_anyhow_error_conversion() {
        let server_err: ServerError = anyhow::anyhow!("something went wrong").into();
        assert!(server_err.to_string().contains("Internal error"));
        assert!(server_err.to_string().contains("something went wrong"));
    }

    #[test]
    fn test_into_response_status() {
        let cases = [
            (ServerError::ServiceError("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (ServerError::GeneratorUnavailable("x".into()), StatusCode::BAD_GATEWAY),
            (ServerError::InvalidRequest("x".into()), StatusCode::BAD_REQUEST),
            (ServerError::InternalError("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (ServerError::NotFound("x".into()), StatusCode::NOT_FOUND),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ServerError>();
    }
}
