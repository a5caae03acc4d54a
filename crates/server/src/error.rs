//! HTTP error responses.
//!
//! Every handler failure ends up here. Clients get a status and a fixed
//! message; the underlying error text only goes to the log.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Client input failed validation. The message is safe to show.
    #[error("BAD_REQUEST: {0}")]
    BadRequest(&'static str),

    #[error("UNAUTHORIZED")]
    Unauthorized,

    /// Feature disabled by configuration, or a rejected credential.
    #[error("FORBIDDEN: {0}")]
    Forbidden(&'static str),

    #[error("NOT_FOUND")]
    NotFound,

    #[error("REQUEST_TIMEOUT")]
    RequestTimeout,

    #[error("PAYLOAD_TOO_LARGE")]
    PayloadTooLarge,

    #[error("RATE_LIMITED")]
    TooManyRequests,

    #[error("UNAVAILABLE: {0}")]
    Unavailable(String),

    #[error("INTERNAL: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> &'static str {
        match self {
            ApiError::BadRequest(msg) | ApiError::Forbidden(msg) => msg,
            ApiError::Unauthorized => "unauthorized",
            ApiError::NotFound => "not found",
            ApiError::RequestTimeout => "request body not received in time",
            ApiError::PayloadTooLarge => "request body too large",
            ApiError::TooManyRequests => "too many requests, try again later",
            ApiError::Unavailable(_) => "service unavailable",
            ApiError::Internal(_) => "internal error",
        }
    }
}

impl From<quire_core::Error> for ApiError {
    fn from(err: quire_core::Error) -> Self {
        match err {
            quire_core::Error::NotFound(_) => ApiError::NotFound,
            quire_core::Error::InvalidInput(_) => ApiError::BadRequest("invalid input"),
            quire_core::Error::Database(tokio_rusqlite::Error::ConnectionClosed) => {
                ApiError::Unavailable("store connection closed".into())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Internal(detail) | ApiError::Unavailable(detail) => {
                tracing::error!(error = %detail, "request failed");
            }
            _ => tracing::debug!(error = %self, "request rejected"),
        }
        (self.status(), Json(ErrorBody { error: self.public_message() })).into_response()
    }
}
