//! Time types for normalization requests.
//!
//! This module provides [`RawTime`] for the three kinds of time values a
//! source calendar can carry, [`TimeWindow`] for the expansion range, and
//! [`TzStrategy`] for how instants are rendered in the output.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Days, Duration, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{NormalizeError, NormalizeResult};
use crate::zone::attach_zone;

/// Days before "now" covered by the default window.
pub const DEFAULT_WINDOW_PAST_DAYS: i64 = 7;

/// Days after "now" covered by the default window.
pub const DEFAULT_WINDOW_FUTURE_DAYS: i64 = 90;

/// A time value as it appears in a source calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawTime {
    /// An aware instant (UTC or carrying a known zone).
    Zoned(DateTime<Tz>),
    /// A wall-clock value without zone information.
    Naive(NaiveDateTime),
    /// A calendar date without a time of day.
    Date(NaiveDate),
}

impl RawTime {
    /// Creates an aware value from a UTC instant.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self::Zoned(dt.with_timezone(&Tz::UTC))
    }

    /// Returns true if this is a bare date.
    pub fn is_date(&self) -> bool {
        matches!(self, Self::Date(_))
    }

    /// Returns a value comparable across occurrences of the same series.
    ///
    /// Aware values compare by their UTC instant, naive values by their
    /// wall clock and dates by midnight.
    pub fn comparison_key(&self) -> NaiveDateTime {
        match self {
            Self::Zoned(dt) => dt.naive_utc(),
            Self::Naive(naive) => *naive,
            Self::Date(date) => date.and_time(chrono::NaiveTime::MIN),
        }
    }

    /// Shifts the wall clock by `delta`, keeping the kind.
    ///
    /// Aware values move on their local clock and are resolved back in
    /// their own zone, so a series keeps its local length across DST
    /// changes. Dates move by whole days only.
    pub fn checked_add_wall_clock(&self, delta: Duration) -> NormalizeResult<Self> {
        let overflow = NormalizeError::Overflow("wall-clock shift");
        match self {
            Self::Zoned(dt) => {
                let local = dt.naive_local().checked_add_signed(delta).ok_or(overflow)?;
                attach_zone(local, dt.timezone()).map(Self::Zoned)
            }
            Self::Naive(naive) => naive.checked_add_signed(delta).map(Self::Naive).ok_or(overflow),
            Self::Date(date) => date
                .checked_add_signed(Duration::days(delta.num_days()))
                .map(Self::Date)
                .ok_or(overflow),
        }
    }

    /// Wall-clock span from `self` to `end`.
    ///
    /// An aware `end` is read in the zone of an aware `self`; other mixes
    /// fall back to comparison keys.
    pub fn wall_clock_until(&self, end: &RawTime) -> Duration {
        match (self, end) {
            (Self::Zoned(start), Self::Zoned(end)) => {
                end.with_timezone(&start.timezone()).naive_local() - start.naive_local()
            }
            _ => end.comparison_key() - self.comparison_key(),
        }
    }
}

/// A DURATION value: nominal days plus an exact time part.
///
/// Days (and weeks) follow the calendar, so `P1D` from 10:00 ends at 10:00
/// the next day even across a DST change. The time part is elapsed time:
/// `PT24H` is exactly 24 hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CalendarDuration {
    days: i64,
    time: Duration,
}

impl CalendarDuration {
    /// Creates a duration from nominal days and an exact time part.
    pub fn new(days: i64, time: Duration) -> Self {
        Self { days, time }
    }

    /// A whole number of calendar days.
    pub fn days(days: i64) -> Self {
        Self::new(days, Duration::zero())
    }

    /// An exact elapsed time.
    pub fn exact(time: Duration) -> Self {
        Self::new(0, time)
    }

    /// Nominal day count.
    pub fn day_count(&self) -> i64 {
        self.days
    }

    /// Exact time part.
    pub fn time(&self) -> Duration {
        self.time
    }

    /// Returns the negated duration.
    pub fn negated(self) -> Self {
        Self::new(-self.days, -self.time)
    }

    /// Elapsed time with every day counted as 24 hours.
    pub fn approximate(&self) -> Duration {
        Duration::days(self.days) + self.time
    }

    /// Adds the duration to `start`: days on the local calendar (resolved
    /// through [`attach_zone`]), then the time part as elapsed time.
    ///
    /// # Errors
    ///
    /// Fails on overflow or when the shifted wall clock cannot be resolved.
    pub fn add_to(&self, start: DateTime<Tz>) -> NormalizeResult<DateTime<Tz>> {
        let overflow = NormalizeError::Overflow("end from duration");
        let local = start.naive_local();
        let shifted = if self.days >= 0 {
            local.checked_add_days(Days::new(self.days.unsigned_abs()))
        } else {
            local.checked_sub_days(Days::new(self.days.unsigned_abs()))
        }
        .ok_or(overflow.clone())?;
        let on_day = if self.days == 0 {
            start
        } else {
            attach_zone(shifted, start.timezone())?
        };
        on_day.checked_add_signed(self.time).ok_or(overflow)
    }
}

impl From<Duration> for CalendarDuration {
    fn from(time: Duration) -> Self {
        Self::exact(time)
    }
}

/// A time window for expanding occurrences.
///
/// Both bounds are UTC instants and `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Start of the window (inclusive).
    pub start: DateTime<Utc>,
    /// End of the window (exclusive).
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Creates a new time window.
    ///
    /// # Errors
    ///
    /// Returns [`NormalizeError::InvalidWindow`] if `start` is after `end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> NormalizeResult<Self> {
        if start > end {
            return Err(NormalizeError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// The default window around `now`: seven days back, ninety days ahead.
    pub fn default_around(now: DateTime<Utc>) -> Self {
        Self {
            start: now - Duration::days(DEFAULT_WINDOW_PAST_DAYS),
            end: now + Duration::days(DEFAULT_WINDOW_FUTURE_DAYS),
        }
    }

    /// Builds a window from optional bounds, filling gaps from the default
    /// window around `now`.
    pub fn resolve(
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> NormalizeResult<Self> {
        let default = Self::default_around(now);
        Self::new(start.unwrap_or(default.start), end.unwrap_or(default.end))
    }

    /// Returns the duration of this time window.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Checks if a datetime falls within this window.
    ///
    /// Uses half-open interval semantics: `[start, end)`.
    pub fn contains(&self, dt: DateTime<Utc>) -> bool {
        self.start <= dt && dt < self.end
    }

    /// Checks if a span starting at `start` and ending at `end` overlaps the
    /// window. Zero-length spans overlap when their start is contained.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        if end <= start {
            return self.contains(start);
        }
        start < self.end && end > self.start
    }
}

/// How instants are rendered in the output document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TzStrategy {
    /// Local time in the target zone with a `TZID` parameter.
    #[default]
    Tzid,
    /// UTC instants with a `Z` suffix.
    Utc,
    /// Target-zone wall clock without any zone marker.
    Floating,
}

impl TzStrategy {
    /// Returns the selector string for this strategy.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tzid => "tzid",
            Self::Utc => "utc",
            Self::Floating => "floating",
        }
    }
}

impl fmt::Display for TzStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TzStrategy {
    type Err = NormalizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tzid" => Ok(Self::Tzid),
            "utc" => Ok(Self::Utc),
            "floating" => Ok(Self::Floating),
            _ => Err(NormalizeError::UnknownStrategy(s.to_string())),
        }
    }
}
