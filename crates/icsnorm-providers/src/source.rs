//! Collaborator traits for the normalization pipeline.
//!
//! The pipeline never talks to the network, the calendar grammar or the
//! recurrence engine directly. It goes through these three traits:
//!
//! - [`DocumentFetcher`]: retrieves raw bytes for a source location
//! - [`DocumentParser`]: turns bytes into a [`ParsedCalendar`]
//! - [`OccurrenceExpander`]: produces the [`RawOccurrence`]s overlapping a window
//!
//! The crate ships one implementation of each: [`SourceFetcher`](crate::SourceFetcher),
//! [`IcsParser`](crate::IcsParser) and [`RecurrenceExpander`](crate::RecurrenceExpander).

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use icsnorm_core::TimeWindow;

use crate::calendar::ParsedCalendar;
use crate::error::ProviderResult;
use crate::raw_occurrence::RawOccurrence;

/// A boxed future for async trait methods.
///
/// Boxed futures keep [`DocumentFetcher`] object-safe so the server can hold
/// it as `Arc<dyn DocumentFetcher>`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Retrieves the raw bytes of a source calendar.
///
/// # Example Implementation
///
/// ```ignore
/// struct StaticFetcher(Vec<u8>);
///
/// impl DocumentFetcher for StaticFetcher {
///     fn fetch<'a>(
///         &'a self,
///         _source: &'a str,
///         _timeout: Duration,
///     ) -> BoxFuture<'a, ProviderResult<Vec<u8>>> {
///         let bytes = self.0.clone();
///         Box::pin(async move { Ok(bytes) })
///     }
/// }
/// ```
pub trait DocumentFetcher: Send + Sync {
    /// Fetches `source`, giving up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns a transport error (network, status, not found, timeout).
    fn fetch<'a>(
        &'a self,
        source: &'a str,
        timeout: Duration,
    ) -> BoxFuture<'a, ProviderResult<Vec<u8>>>;
}

/// Parses a raw calendar document.
pub trait DocumentParser: Send + Sync {
    /// Parses `bytes` into a calendar tree.
    ///
    /// # Errors
    ///
    /// Returns a parse error for malformed input.
    fn parse(&self, bytes: &[u8]) -> ProviderResult<ParsedCalendar>;
}

/// Expands a parsed calendar into concrete occurrences.
pub trait OccurrenceExpander: Send + Sync {
    /// Returns every occurrence overlapping `window`, recurrences expanded.
    ///
    /// Events without a start are passed through unchanged.
    ///
    /// # Errors
    ///
    /// Returns an expansion error when a recurrence rule is invalid.
    fn expand(
        &self,
        calendar: &ParsedCalendar,
        window: &TimeWindow,
    ) -> ProviderResult<Vec<RawOccurrence>>;
}
