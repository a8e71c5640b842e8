//! Server configuration.
//!
//! Values come from, in increasing priority: built-in defaults, an optional
//! TOML file, then environment variables and command-line flags (applied by
//! the CLI layer).

use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::ValueEnum;
use icsnorm_core::ics::DEFAULT_DOCUMENT_NAME;
use icsnorm_core::{TzStrategy, parse_zone};
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Output zone used when a request does not name one.
pub const DEFAULT_TZID: &str = "Europe/Paris";

/// Zone attached to naive source times when a request does not name one.
pub const DEFAULT_FALLBACK_TZID: &str = "UTC";

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "icsnorm.toml";

/// Deployment environment. `Dev` mounts the `/docs` endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    #[default]
    Prod,
}

impl Environment {
    /// Returns true for the development environment.
    pub fn is_dev(&self) -> bool {
        matches!(self, Self::Dev)
    }

    /// Interprets an `ENVIRONMENT`-style value: only `dev` selects `Dev`.
    pub fn from_value(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("dev") => Self::Dev,
            _ => Self::Prod,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Dev => "dev",
            Self::Prod => "prod",
        })
    }
}

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    pub bind: SocketAddr,

    /// Upstream fetch timeout, in seconds.
    pub fetch_timeout_secs: u64,

    /// `max-age` sent in `Cache-Control`, in seconds.
    pub cache_max_age: u64,

    /// Default output zone.
    pub tzid: String,

    /// Default zone for naive source times.
    pub default_tzid: String,

    /// Default rendering strategy.
    pub tz_strategy: TzStrategy,

    /// `X-WR-CALNAME` of produced documents.
    pub document_name: String,

    /// Deployment environment.
    pub environment: Environment,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8000)),
            fetch_timeout_secs: 20,
            cache_max_age: 3600,
            tzid: DEFAULT_TZID.to_string(),
            default_tzid: DEFAULT_FALLBACK_TZID.to_string(),
            tz_strategy: TzStrategy::default(),
            document_name: DEFAULT_DOCUMENT_NAME.to_string(),
            environment: Environment::default(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a TOML file.
    pub fn load_from(path: &Path) -> ServerResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ServerError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content)
            .map_err(|e| ServerError::config(format!("failed to parse {}: {}", path.display(), e)))
    }

    /// Loads `path` if given, else [`DEFAULT_CONFIG_FILE`] if it exists, else
    /// the defaults.
    pub fn load(path: Option<&Path>) -> ServerResult<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::load_from(&default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Checks that the configured zones exist.
    pub fn validate(&self) -> ServerResult<()> {
        parse_zone(&self.tzid).map_err(|e| ServerError::config(format!("tzid: {}", e)))?;
        parse_zone(&self.default_tzid)
            .map_err(|e| ServerError::config(format!("default_tzid: {}", e)))?;
        if self.fetch_timeout_secs == 0 {
            return Err(ServerError::config("fetch_timeout_secs must be positive"));
        }
        Ok(())
    }

    /// Returns the fetch timeout.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Returns the `Cache-Control` header value.
    pub fn cache_control(&self) -> String {
        format!("public, max-age={}", self.cache_max_age)
    }

    /// Builder: set bind address.
    pub fn with_bind(mut self, bind: SocketAddr) -> Self {
        self.bind = bind;
        self
    }

    /// Builder: set fetch timeout in seconds.
    pub fn with_fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.fetch_timeout_secs = secs;
        self
    }

    /// Builder: set cache max-age in seconds.
    pub fn with_cache_max_age(mut self, secs: u64) -> Self {
        self.cache_max_age = secs;
        self
    }

    /// Builder: set environment.
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }
}
