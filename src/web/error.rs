//! Web-level errors with HTTP status mapping.
//!
//! Recoverable conditions (unknown medicine, duplicate user, bad login) are
//! rendered inline as page notices and never reach this type.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use crate::credentials::CredentialError;
use crate::web::pages;

#[derive(Debug, thiserror::Error)]
pub enum WebError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            WebError::NotFound(detail) => (StatusCode::NOT_FOUND, detail.clone()),
            WebError::Internal(detail) => {
                tracing::error!(detail, "Web internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        (status, Html(pages::render_error(status, &message))).into_response()
    }
}

impl From<CredentialError> for WebError {
    fn from(err: CredentialError) -> Self {
        WebError::Internal(err.to_string())
    }
}

impl From<std::io::Error> for WebError {
    fn from(err: std::io::Error) -> Self {
        WebError::Internal(err.to_string())
    }
}
