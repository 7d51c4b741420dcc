use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::config::RunMode;
use crate::model::ErrorBody;

/// Generic message returned to clients when every generation attempt failed
pub const UNAVAILABLE_ERROR: &str = "Failed to generate recipe";
pub const UNAVAILABLE_MESSAGE: &str = "The AI service is temporarily unavailable. Please try again.";
pub const INVALID_INGREDIENTS: &str = "Please provide valid ingredients";

/// Failure of a single call to the inference service. Every variant is retried.
#[derive(Error, Debug)]
pub enum CallError {
    /// Transport-level failure (connect, TLS, timeout, body decode)
    #[error("Request to inference service failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status
    #[error("Inference service returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response did not carry generated text where expected
    #[error("Malformed response from inference service: {0}")]
    MalformedResponse(String),
}

/// Errors surfaced to HTTP clients
#[derive(Error, Debug)]
pub enum ApiError {
    /// Bad or missing input, reported before any outbound call
    #[error("{0}")]
    Validation(String),

    /// All generation attempts failed
    #[error("The AI service is temporarily unavailable")]
    ServiceUnavailable { details: Option<String> },
}

impl ApiError {
    pub fn invalid_ingredients() -> Self {
        ApiError::Validation(INVALID_INGREDIENTS.to_string())
    }

    /// Build the exhausted-retries error. The underlying cause is only kept in development mode.
    pub fn service_unavailable(cause: &CallError, mode: RunMode) -> Self {
        let details = match mode {
            RunMode::Development => Some(cause.to_string()),
            RunMode::Production => None,
        };
        ApiError::ServiceUnavailable { details }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::ServiceUnavailable { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> ErrorBody {
        match self {
            ApiError::Validation(msg) => ErrorBody {
                error: msg.clone(),
                message: None,
                details: None,
            },
            ApiError::ServiceUnavailable { details } => ErrorBody {
                error: UNAVAILABLE_ERROR.to_string(),
                message: Some(UNAVAILABLE_MESSAGE.to_string()),
                details: details.clone(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.body())).into_response()
    }
}

/// Fatal errors that keep the server from starting
#[derive(Error, Debug)]
pub enum StartupError {
    /// No access token for the inference service
    #[error("HF_ACCESS_TOKEN not found in config or environment")]
    MissingAccessToken,

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// An allowed origin is not a valid header value
    #[error("Invalid allowed origin: {0}")]
    InvalidOrigin(String),

    /// HTTP client could not be built
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    /// Binding or serving failed
    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}
