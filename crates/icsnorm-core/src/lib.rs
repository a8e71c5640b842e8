//! Core types: zones, time windows, canonical events, serialization, fingerprints

pub mod error;
pub mod event;
pub mod fingerprint;
pub mod ics;
pub mod time;
pub mod tracing;
pub mod zone;

pub use chrono_tz::Tz;
pub use error::{NormalizeError, NormalizeResult};
pub use event::{CanonicalEvent, NormalizedDocument};
pub use fingerprint::{fingerprint, matches_if_none_match};
pub use ics::{DEFAULT_DOCUMENT_NAME, PRODUCT_ID, ZoneBlock, serialize};
pub use time::{CalendarDuration, RawTime, TimeWindow, TzStrategy};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
pub use zone::{ZonedValue, ensure_zoned, parse_zone, to_target_zone};
