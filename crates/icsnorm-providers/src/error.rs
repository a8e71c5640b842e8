//! Error types for calendar source operations.
//!
//! This module defines the errors raised while fetching, parsing and
//! expanding a source calendar.

use std::fmt;
use thiserror::Error;

/// The category of a provider error.
///
/// The server maps every code to the same HTTP status; the code exists for
/// logs and for callers that want to tell transport failures from bad data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorCode {
    /// Connection failed, DNS resolution, TLS, or a broken body stream.
    NetworkError,
    /// The upstream answered with a non-success status.
    UpstreamStatus,
    /// The upstream resource or local file does not exist.
    NotFound,
    /// The fetch did not complete within the allotted time.
    Timeout,
    /// The document is not a well-formed calendar.
    ParseError,
    /// A recurrence rule could not be expanded.
    ExpansionError,
    /// Unexpected state, bug.
    InternalError,
}

impl ProviderErrorCode {
    /// Returns true if the failure happened while retrieving the document.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::NetworkError | Self::UpstreamStatus | Self::NotFound | Self::Timeout
        )
    }

    /// Returns a machine-readable name for this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NetworkError => "network_error",
            Self::UpstreamStatus => "upstream_status",
            Self::NotFound => "not_found",
            Self::Timeout => "timeout",
            Self::ParseError => "parse_error",
            Self::ExpansionError => "expansion_error",
            Self::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error raised by a fetcher, parser or expander.
#[derive(Debug, Error)]
pub struct ProviderError {
    code: ProviderErrorCode,
    message: String,
    /// The source location (URL or path) involved, if known.
    source_ref: Option<String>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderError {
    /// Creates a new provider error with the given code and message.
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source_ref: None,
            source: None,
        }
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NetworkError, message)
    }

    /// Creates an upstream status error.
    pub fn upstream_status(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::UpstreamStatus, message)
    }

    /// Creates a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NotFound, message)
    }

    /// Creates a timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::Timeout, message)
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ParseError, message)
    }

    /// Creates an expansion error.
    pub fn expansion(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ExpansionError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InternalError, message)
    }

    /// Sets the source location (URL or path) for this error.
    pub fn with_source_ref(mut self, source_ref: impl Into<String>) -> Self {
        self.source_ref = Some(source_ref.into());
        self
    }

    /// Sets the underlying error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error code.
    pub fn code(&self) -> ProviderErrorCode {
        self.code
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the source location, if set.
    pub fn source_ref(&self) -> Option<&str> {
        self.source_ref.as_deref()
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        if let Some(ref source_ref) = self.source_ref {
            write!(f, " ({})", source_ref)?;
        }
        Ok(())
    }
}

/// A specialized Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;
