//! Mapping of store errors onto HTTP responses.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{debug, error};

use crate::error::Error;

/// An error response: a status code and `{"error": message}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    /// Map a store error, using `fallback` as the body of a 500.
    ///
    /// Server-side failures are logged in full and answered with the
    /// static `fallback` text only.
    #[must_use]
    pub fn from_error(err: &Error, fallback: &'static str) -> Self {
        let (status, message) = match err {
            Error::ClientNotFound { .. } => (StatusCode::NOT_FOUND, "Client not found".to_string()),
            Error::DuplicateClient { .. } => {
                (StatusCode::CONFLICT, "Client already exists".to_string())
            }
            Error::InvalidClient { message } => (StatusCode::UNPROCESSABLE_ENTITY, message.clone()),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, fallback.to_string()),
        };

        if status.is_server_error() {
            error!("{fallback}: {err}");
        } else {
            debug!("{status}: {err}");
        }

        Self { status, message }
    }

    /// A 404 for an unknown route.
    #[must_use]
    pub fn route_not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: "Not found".to_string(),
        }
    }

    /// The response status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The response message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!("Rejected request body: {rejection}");
        Self {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
