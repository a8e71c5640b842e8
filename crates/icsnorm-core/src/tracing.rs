//! Tracing setup for icsnorm
//!
//! Provides one logging configuration shared by the server and the CLI.
//!
//! # Usage
//!
//! For one-shot rendering from the command line:
//! ```ignore
//! use icsnorm_core::tracing::{init_tracing, TracingConfig};
//!
//! init_tracing(TracingConfig::cli()).expect("failed to initialize tracing");
//! ```
//!
//! For the HTTP server:
//! ```ignore
//! use icsnorm_core::tracing::{init_tracing, TracingConfig, TracingOutputFormat};
//!
//! init_tracing(TracingConfig::server().with_format(TracingOutputFormat::Json))
//!     .expect("failed to initialize tracing");
//! ```

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self as sfmt, format::FmtSpan},
    prelude::*,
};

/// Crates whose events pass the default filter.
const LOG_TARGETS: &[&str] = &["icsnorm_core", "icsnorm_providers", "icsnorm_server", "icsnorm"];

/// Errors that can occur during tracing initialization
#[derive(Debug, Error)]
pub enum TracingError {
    /// Failed to set global subscriber
    #[error("failed to set global tracing subscriber: {0}")]
    SetGlobalSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),

    /// Failed to parse env filter directive
    #[error("failed to parse env filter: {0}")]
    EnvFilter(#[from] tracing_subscriber::filter::ParseError),

    /// Unknown output format name
    #[error("unknown log format: {0} (expected pretty, compact or json)")]
    UnknownFormat(String),
}

/// Output format for tracing logs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingOutputFormat {
    /// Human-readable multi-line format
    Pretty,
    /// Compact single-line format (default)
    #[default]
    Compact,
    /// JSON lines, for log shippers
    Json,
}

impl fmt::Display for TracingOutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pretty => "pretty",
            Self::Compact => "compact",
            Self::Json => "json",
        })
    }
}

impl FromStr for TracingOutputFormat {
    type Err = TracingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(TracingError::UnknownFormat(other.to_string())),
        }
    }
}

/// Configuration for tracing initialization
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// The level for icsnorm crates when RUST_LOG is not set
    pub default_level: Level,
    /// Output format for log messages
    pub output_format: TracingOutputFormat,
    /// Whether to include file/line information in logs
    pub include_location: bool,
    /// Whether to include target (module path) in logs
    pub include_target: bool,
    /// Whether to include timestamps
    pub include_timestamp: bool,
    /// Whether to log span close events (request timings)
    pub include_span_events: bool,
    /// Custom env filter directive (overrides default_level if set)
    pub env_filter: Option<String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self::server()
    }
}

impl TracingConfig {
    /// Quiet configuration for `icsnorm render`: warnings only, to stderr.
    #[must_use]
    pub fn cli() -> Self {
        Self {
            default_level: Level::WARN,
            output_format: TracingOutputFormat::Compact,
            include_location: false,
            include_target: false,
            include_timestamp: false,
            include_span_events: false,
            env_filter: None,
        }
    }

    /// Configuration for the long-running HTTP server.
    #[must_use]
    pub fn server() -> Self {
        Self {
            default_level: Level::INFO,
            output_format: TracingOutputFormat::Compact,
            include_location: false,
            include_target: true,
            include_timestamp: true,
            include_span_events: true,
            env_filter: None,
        }
    }

    /// Set the default log level
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.default_level = level;
        self
    }

    /// Set the output format
    #[must_use]
    pub fn with_format(mut self, format: TracingOutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Set a custom env filter directive
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// The filter directive used when neither `env_filter` nor `RUST_LOG` is set.
    pub fn default_directive(&self) -> String {
        let level = self.default_level.as_str().to_ascii_lowercase();
        LOG_TARGETS
            .iter()
            .map(|target| format!("{target}={level}"))
            .collect::<Vec<_>>()
            .join(",")
    }

    fn span_events(&self) -> FmtSpan {
        if self.include_span_events {
            FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }
}

/// Initialize tracing with the given configuration.
///
/// This should be called once at process start. `RUST_LOG` overrides the
/// default directive; logs go to stderr so rendered documents can be piped
/// from stdout.
///
/// # Errors
///
/// Returns an error if the global subscriber has already been set or if
/// the env filter directive is invalid.
pub fn init_tracing(config: TracingConfig) -> Result<(), TracingError> {
    let env_filter = match config.env_filter {
        Some(ref filter) => EnvFilter::try_new(filter)?,
        None => EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(config.default_directive()))?,
    };

    let base = sfmt::layer()
        .with_writer(std::io::stderr)
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_target(config.include_target)
        .with_span_events(config.span_events());

    let layer = match config.output_format {
        TracingOutputFormat::Pretty => base.pretty().boxed(),
        TracingOutputFormat::Json => base.json().boxed(),
        TracingOutputFormat::Compact if config.include_timestamp => base.compact().boxed(),
        TracingOutputFormat::Compact => base.compact().without_time().boxed(),
    };

    let subscriber = tracing_subscriber::registry().with(env_filter).with(layer);
    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}
