//! API error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// Result alias for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// An error rendered as a JSON body with an HTTP status.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    /// 500 with a message body.
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }

    /// The one caller-visible failure: the provider API key is
    /// entirely absent.
    pub fn missing_credentials() -> Self {
        Self::internal("provider API key is not configured")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}
