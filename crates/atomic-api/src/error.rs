//! Error types for the game API.
//!
//! [`ApiError`] wraps every failure a handler can hit and converts it into
//! an Axum response with a `{"error", "status"}` JSON body. Game errors
//! are mapped by their [`ErrorClass`]; internal failures never leak their
//! cause to the caller.

use atomic_core::{ErrorClass, GameError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

/// Errors that can occur in the API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The game service rejected or failed the operation.
    #[error(transparent)]
    Game(#[from] GameError),

    /// A path segment or query parameter could not be parsed.
    #[error("invalid request: {0}")]
    BadRequest(String),
}

impl ApiError {
    /// The HTTP status this error maps to.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Game(err) => match err.class() {
                ErrorClass::Invalid => StatusCode::BAD_REQUEST,
                ErrorClass::NotFound => StatusCode::NOT_FOUND,
                ErrorClass::Declined => StatusCode::CONFLICT,
                ErrorClass::Forbidden => StatusCode::FORBIDDEN,
                ErrorClass::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Game(err) => {
                if err.class() == ErrorClass::Internal {
                    error!(error = %err, "Request failed");
                }
                err.declined_reason()
            }
            Self::BadRequest(msg) => msg.clone(),
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
