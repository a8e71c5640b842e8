//! Timezone normalization.
//!
//! Source calendars mix three kinds of time values: aware instants, naive
//! wall-clock values and bare dates. This module turns all of them into
//! aware instants, under two deliberately different fallback rules:
//!
//! - naive wall-clock values take the caller's **default** zone
//!   ([`ensure_zoned_naive`]);
//! - bare dates become midnight in the **target** output zone
//!   ([`ensure_zoned_date`]).
//!
//! Both rules are kept as separate functions so the asymmetry stays visible.
//! [`ensure_zoned`] dispatches between them.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::trace;

use crate::error::{NormalizeError, NormalizeResult};
use crate::time::RawTime;

/// Resolves an IANA zone identifier such as `Europe/Paris`.
///
/// # Errors
///
/// Returns [`NormalizeError::UnknownZone`] if the identifier is not known.
pub fn parse_zone(id: &str) -> NormalizeResult<Tz> {
    id.trim()
        .parse::<Tz>()
        .map_err(|_| NormalizeError::UnknownZone(id.to_string()))
}

/// An aware instant produced by [`ensure_zoned`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZonedValue {
    /// The resolved instant.
    pub instant: DateTime<Tz>,
    /// True when the source value was a bare date.
    pub all_day: bool,
}

/// Resolves any raw time value into an aware instant.
///
/// Aware values are returned unchanged, naive values are attached to
/// `default_zone` and dates are attached to `target_zone`.
pub fn ensure_zoned(
    value: &RawTime,
    default_zone: Tz,
    target_zone: Tz,
) -> NormalizeResult<ZonedValue> {
    match value {
        RawTime::Zoned(dt) => Ok(ZonedValue {
            instant: *dt,
            all_day: false,
        }),
        RawTime::Naive(naive) => Ok(ZonedValue {
            instant: ensure_zoned_naive(*naive, default_zone)?,
            all_day: false,
        }),
        RawTime::Date(date) => Ok(ZonedValue {
            instant: ensure_zoned_date(*date, target_zone)?,
            all_day: true,
        }),
    }
}

/// Attaches the caller's default zone to a naive wall-clock value.
pub fn ensure_zoned_naive(naive: NaiveDateTime, default_zone: Tz) -> NormalizeResult<DateTime<Tz>> {
    attach_zone(naive, default_zone)
}

/// Builds midnight of `date` in the target output zone.
pub fn ensure_zoned_date(date: NaiveDate, target_zone: Tz) -> NormalizeResult<DateTime<Tz>> {
    attach_zone(date.and_time(chrono::NaiveTime::MIN), target_zone)
}

/// Converts an aware instant to the target zone.
pub fn to_target_zone<Z: TimeZone>(instant: &DateTime<Z>, target_zone: Tz) -> DateTime<Tz> {
    instant.with_timezone(&target_zone)
}

/// Converts a naive instant to the target zone, reading it as UTC first.
pub fn to_target_zone_naive(naive: NaiveDateTime, target_zone: Tz) -> DateTime<Tz> {
    Utc.from_utc_datetime(&naive).with_timezone(&target_zone)
}

/// Interprets a wall-clock value in `zone`.
///
/// Ambiguous values (DST fold) take the earliest instant. Values that fall
/// in a DST gap are moved forward by one hour.
pub fn attach_zone(local: NaiveDateTime, zone: Tz) -> NormalizeResult<DateTime<Tz>> {
    match zone.from_local_datetime(&local) {
        LocalResult::Single(dt) => Ok(dt),
        LocalResult::Ambiguous(earliest, _) => {
            trace!(%local, zone = zone.name(), "Ambiguous local time, using earliest");
            Ok(earliest)
        }
        LocalResult::None => {
            trace!(%local, zone = zone.name(), "Local time in DST gap, shifting forward");
            let shifted = local
                .checked_add_signed(Duration::hours(1))
                .ok_or(NormalizeError::Overflow("DST gap shift"))?;
            zone.from_local_datetime(&shifted).earliest().ok_or_else(|| {
                NormalizeError::UnresolvableLocalTime {
                    local,
                    zone: zone.name().to_string(),
                }
            })
        }
    }
}
