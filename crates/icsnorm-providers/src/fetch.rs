//! Source document fetcher.
//!
//! `http://` and `https://` sources are downloaded with `reqwest`; anything
//! else is read as a local path. Both paths run under the caller's timeout.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::{debug, trace};
use url::Url;

use crate::error::{ProviderError, ProviderResult};
use crate::source::{BoxFuture, DocumentFetcher};

/// Default timeout for a single fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(20);

const USER_AGENT: &str = concat!("icsnorm/", env!("CARGO_PKG_VERSION"));

/// Where a source document lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    /// A remote document.
    Http(Url),
    /// A file on the local filesystem.
    File(PathBuf),
}

impl SourceLocation {
    /// Classifies a source string.
    ///
    /// Only `http`/`https` URLs (scheme matched case-insensitively) are
    /// remote; every other string is treated as a local path.
    ///
    /// # Errors
    ///
    /// Returns a network error for an `http(s)` source that is not a valid URL.
    pub fn classify(source: &str) -> ProviderResult<Self> {
        let lower = source.trim_start().to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            let url = Url::parse(source.trim()).map_err(|e| {
                ProviderError::network(format!("Invalid source URL: {}", e))
                    .with_source_ref(source)
                    .with_source(e)
            })?;
            Ok(Self::Http(url))
        } else {
            Ok(Self::File(PathBuf::from(source)))
        }
    }
}

/// Fetches source documents over HTTP(S) or from the local filesystem.
#[derive(Debug, Clone)]
pub struct SourceFetcher {
    client: Client,
}

impl SourceFetcher {
    /// Creates a fetcher with its own HTTP client.
    pub fn new() -> ProviderResult<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ProviderError::internal(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Creates a fetcher sharing an existing HTTP client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn fetch_http(&self, url: Url, timeout: Duration) -> ProviderResult<Vec<u8>> {
        trace!(url = %url, "Sending GET request");
        let response = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| request_error(e, url.as_str()))?;

        let status = response.status();
        trace!(status = %status, "Received response");
        match status {
            s if s.is_success() => {
                let body = response
                    .bytes()
                    .await
                    .map_err(|e| request_error(e, url.as_str()))?;
                Ok(body.to_vec())
            }
            StatusCode::NOT_FOUND => Err(ProviderError::not_found(
                "Upstream calendar not found (404)",
            )
            .with_source_ref(url.as_str())),
            s => Err(ProviderError::upstream_status(format!("Upstream returned {}", s))
                .with_source_ref(url.as_str())),
        }
    }

    async fn fetch_file(&self, path: PathBuf, timeout: Duration) -> ProviderResult<Vec<u8>> {
        let display = path.display().to_string();
        let read = tokio::time::timeout(timeout, tokio::fs::read(&path))
            .await
            .map_err(|_| {
                ProviderError::timeout(format!("Reading file timed out after {:?}", timeout))
                    .with_source_ref(&display)
            })?;
        read.map_err(|e| {
            let err = match e.kind() {
                ErrorKind::NotFound => ProviderError::not_found("Source file not found"),
                _ => ProviderError::network(format!("Failed to read source file: {}", e)),
            };
            err.with_source_ref(&display).with_source(e)
        })
    }
}

impl DocumentFetcher for SourceFetcher {
    fn fetch<'a>(
        &'a self,
        source: &'a str,
        timeout: Duration,
    ) -> BoxFuture<'a, ProviderResult<Vec<u8>>> {
        Box::pin(async move {
            let bytes = match SourceLocation::classify(source)? {
                SourceLocation::Http(url) => self.fetch_http(url, timeout).await?,
                SourceLocation::File(path) => self.fetch_file(path, timeout).await?,
            };
            debug!(source, bytes = bytes.len(), "Fetched source document");
            Ok(bytes)
        })
    }
}

fn request_error(e: reqwest::Error, url: &str) -> ProviderError {
    let err = if e.is_timeout() {
        ProviderError::timeout(format!("Request timed out: {}", e))
    } else {
        ProviderError::network(format!("Request failed: {}", e))
    };
    err.with_source_ref(url).with_source(e)
}
