//! Server error types.
//!
//! [`ServiceError`] is the per-request taxonomy and knows its HTTP mapping:
//! caller mistakes are `400`, everything else is `502`. [`ServerError`]
//! covers process-level failures (config, bind, I/O).

use std::io;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use icsnorm_core::NormalizeError;
use icsnorm_providers::{ProviderError, ProviderErrorCode};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Result type for request handling.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors raised while serving one normalization request.
///
/// Every failure is all-or-nothing: no partial document is produced.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A request parameter is missing or invalid.
    #[error("Invalid {param}: {message}")]
    Input { param: &'static str, message: String },

    /// The source could not be retrieved.
    #[error("{0}")]
    Upstream(ProviderError),

    /// The source could not be parsed, expanded or normalized.
    #[error("{0}")]
    Parse(String),

    /// Unexpected failure inside the service.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Creates an input error for `param`.
    pub fn input(param: &'static str, message: impl ToString) -> Self {
        Self::Input {
            param,
            message: message.to_string(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns the HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Input { .. } => StatusCode::BAD_REQUEST,
            Self::Upstream(_) | Self::Parse(_) | Self::Internal(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Returns the `detail` text sent to the client.
    pub fn detail(&self) -> String {
        match self {
            Self::Input { .. } => self.to_string(),
            _ => format!("Upstream/normalize error: {}", self),
        }
    }
}

impl From<ProviderError> for ServiceError {
    fn from(err: ProviderError) -> Self {
        match err.code() {
            code if code.is_transport() => Self::Upstream(err),
            ProviderErrorCode::InternalError => Self::Internal(err.to_string()),
            _ => Self::Parse(err.to_string()),
        }
    }
}

impl From<NormalizeError> for ServiceError {
    fn from(err: NormalizeError) -> Self {
        if err.is_input_error() {
            Self::input("parameters", err)
        } else {
            Self::Parse(err.to_string())
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = self.detail();
        if status.is_server_error() {
            warn!(status = status.as_u16(), %detail, "Request failed");
        } else {
            debug!(status = status.as_u16(), %detail, "Rejected request");
        }
        (status, Json(ErrorBody { detail })).into_response()
    }
}

/// Errors that can occur while starting or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// IO error (bind, file, etc.).
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A collaborator could not be created.
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// A one-shot normalization failed.
    #[error("{0}")]
    Service(#[from] ServiceError),
}

impl ServerError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
