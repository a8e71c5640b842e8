//! Error types for normalization.

use chrono::{DateTime, NaiveDateTime, Utc};
use thiserror::Error;

/// A specialized Result type for normalization operations.
pub type NormalizeResult<T> = Result<T, NormalizeError>;

/// Errors raised while resolving zones, windows or canonical events.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    /// The zone identifier is not a known IANA zone.
    #[error("unknown timezone: {0}")]
    UnknownZone(String),

    /// The strategy selector is not one of `tzid`, `utc`, `floating`.
    #[error("unknown tz strategy: {0} (expected tzid, utc or floating)")]
    UnknownStrategy(String),

    /// The window start is after its end.
    #[error("window start {start} is after end {end}")]
    InvalidWindow {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// A wall-clock value has no instant in the given zone.
    #[error("local time {local} cannot be resolved in {zone}")]
    UnresolvableLocalTime { local: NaiveDateTime, zone: String },

    /// Date arithmetic left the representable range.
    #[error("date arithmetic overflow while computing {0}")]
    Overflow(&'static str),
}

impl NormalizeError {
    /// Returns true if the error was caused by caller-supplied parameters
    /// rather than by the calendar data itself.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownZone(_) | Self::UnknownStrategy(_) | Self::InvalidWindow { .. }
        )
    }
}
