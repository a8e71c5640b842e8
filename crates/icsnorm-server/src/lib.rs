//! HTTP service and CLI for the ICS normalizer.
//!
//! This crate wires the collaborators of `icsnorm-providers` and the
//! serializer of `icsnorm-core` into:
//! - [`Pipeline`] - validate, fetch, parse, expand, build, serialize, fingerprint
//! - [`router`] - `GET /calendar.ics`, `GET /` and (dev only) `GET /docs`
//! - [`ServerConfig`] - TOML/env/flag configuration
//! - [`ServiceError`] - request errors and their `400`/`502` mapping
//!
//! # Example
//!
//! ```rust,no_run
//! use icsnorm_server::{ServerConfig, serve};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::default();
//!     serve(config).await?;
//!     Ok(())
//! }
//! ```

pub mod cli;
mod config;
mod error;
mod handler;
mod pipeline;
mod serve;
mod signals;

pub use config::{
    DEFAULT_CONFIG_FILE, DEFAULT_FALLBACK_TZID, DEFAULT_TZID, Environment, ServerConfig,
};
pub use error::{ServerError, ServerResult, ServiceError, ServiceResult};
pub use handler::{AppState, CALENDAR_CONTENT_TYPE, CalendarQuery, parse_instant, router};
pub use pipeline::{NormalizeRequest, NormalizedOutput, Pipeline};
pub use serve::{serve, serve_on};
pub use signals::{ShutdownSignal, SignalHandler};
