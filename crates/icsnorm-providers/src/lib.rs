//! Canonical event builder and calendar source collaborators.
//!
//! This crate sits between a raw calendar source and the serializer:
//!
//! - [`DocumentFetcher`], [`DocumentParser`], [`OccurrenceExpander`] - The
//!   collaborator traits the pipeline drives
//! - [`SourceFetcher`], [`IcsParser`], [`RecurrenceExpander`] - Their
//!   implementations (HTTP/file, RFC 5545, RRULE)
//! - [`RawOccurrence`] - One decoded, not yet normalized occurrence
//! - [`build`] - Conversion to [`CanonicalEvent`](icsnorm_core::CanonicalEvent)
//! - [`ProviderError`] - Error types for source operations
//!
//! # Architecture
//!
//! ```text
//!   source (URL or path)
//!          │
//!          ▼ DocumentFetcher
//!   ┌─────────────┐
//!   │   bytes     │
//!   └──────┬──────┘
//!          ▼ DocumentParser
//!   ┌────────────────┐
//!   │ ParsedCalendar │
//!   └──────┬─────────┘
//!          ▼ OccurrenceExpander (window)
//!   ┌────────────────┐
//!   │ RawOccurrence  │
//!   └──────┬─────────┘
//!          ▼ build()
//!   ┌────────────────┐
//!   │ CanonicalEvent │
//!   └────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use icsnorm_providers::{
//!     DocumentParser, IcsParser, OccurrenceExpander, RecurrenceExpander, build_all,
//! };
//!
//! let calendar = IcsParser::new().parse(&bytes)?;
//! let raws = RecurrenceExpander::new().expand(&calendar, &window)?;
//! let events = build_all(&raws, target_zone, default_zone)?;
//! ```

pub mod calendar;
pub mod error;
pub mod expand;
pub mod fetch;
pub mod ics;
pub mod normalize;
pub mod raw_occurrence;
pub mod source;

// Re-export main types at crate root
pub use calendar::{ParsedCalendar, ParsedEvent, ParsedProperty};
pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use expand::{MAX_OCCURRENCES, RecurrenceExpander};
pub use fetch::{DEFAULT_FETCH_TIMEOUT, SourceFetcher, SourceLocation};
pub use ics::IcsParser;
pub use normalize::{build, build_all};
pub use raw_occurrence::{RawCategories, RawOccurrence};
pub use source::{BoxFuture, DocumentFetcher, DocumentParser, OccurrenceExpander};
