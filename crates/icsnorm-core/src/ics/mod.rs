//! Deterministic iCalendar serialization.
//!
//! Events are emitted in a fixed order (start, then UID) and every property
//! is written in a fixed sequence, so the same canonical input always yields
//! the same bytes. How instants are written depends on the [`TzStrategy`]:
//!
//! | Event    | `tzid`                         | `utc`               | `floating`          |
//! |----------|--------------------------------|---------------------|---------------------|
//! | timed    | `;TZID=<zone>:YYYYMMDDTHHMMSS` | `:YYYYMMDDTHHMMSSZ` | `:YYYYMMDDTHHMMSS`  |
//! | all-day  | `;VALUE=DATE:YYYYMMDD`         | same                | same                |
//!
//! # Example
//!
//! ```rust
//! use chrono::TimeZone;
//! use chrono_tz::Europe::Paris;
//! use icsnorm_core::{CanonicalEvent, TzStrategy, ics::serialize};
//!
//! let start = Paris.with_ymd_and_hms(2024, 1, 10, 10, 0, 0).unwrap();
//! let event = CanonicalEvent::new("E1", "Standup").with_span(start, None);
//! let bytes = serialize(&[event], "Team", Paris, TzStrategy::Tzid);
//! let text = String::from_utf8(bytes).unwrap();
//! assert!(text.contains("DTSTART;TZID=Europe/Paris:20240110T100000\r\n"));
//! ```

mod writer;

#[cfg(test)]
mod golden_tests;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::event::{CanonicalEvent, NormalizedDocument};
use crate::time::TzStrategy;

pub use writer::{ContentWriter, MAX_LINE_OCTETS, escape_text};

/// Product identifier written into every document.
pub const PRODUCT_ID: &str = "-//ICS Normalizer//v1//EN";

/// Display name used when the caller does not supply one.
pub const DEFAULT_DOCUMENT_NAME: &str = "Normalized Calendar";

const DATE_FORMAT: &str = "%Y%m%d";
const DATE_TIME_FORMAT: &str = "%Y%m%dT%H%M%S";

/// A `VTIMEZONE` block.
///
/// Only the identifier is written: no STANDARD/DAYLIGHT rules. Consumers are
/// expected to resolve the identifier against their own zone database.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ZoneBlock {
    /// A block carrying nothing but `TZID`.
    IdentifierOnly { tzid: String },
}

impl ZoneBlock {
    /// The block emitted for `strategy`, if any.
    pub fn for_strategy(strategy: TzStrategy, zone: Tz) -> Option<Self> {
        match strategy {
            TzStrategy::Tzid => Some(Self::IdentifierOnly {
                tzid: zone.name().to_string(),
            }),
            TzStrategy::Utc | TzStrategy::Floating => None,
        }
    }

    fn write(&self, w: &mut ContentWriter) {
        match self {
            Self::IdentifierOnly { tzid } => {
                w.begin("VTIMEZONE");
                w.text("TZID", tzid);
                w.end("VTIMEZONE");
            }
        }
    }
}

/// How one instant is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RenderedTime {
    Date(NaiveDate),
    Utc(NaiveDateTime),
    Floating(NaiveDateTime),
    Zoned(NaiveDateTime),
}

fn render_instant(
    instant: DateTime<Tz>,
    all_day: bool,
    strategy: TzStrategy,
    zone: Tz,
) -> RenderedTime {
    let local = instant.with_timezone(&zone);
    if all_day {
        return RenderedTime::Date(local.date_naive());
    }
    match strategy {
        TzStrategy::Utc => RenderedTime::Utc(instant.with_timezone(&Utc).naive_utc()),
        TzStrategy::Floating => RenderedTime::Floating(local.naive_local()),
        TzStrategy::Tzid => RenderedTime::Zoned(local.naive_local()),
    }
}

fn write_time(w: &mut ContentWriter, name: &str, time: RenderedTime, tzid: &str) {
    match time {
        RenderedTime::Date(d) => {
            w.line(name, &[("VALUE", "DATE")], &d.format(DATE_FORMAT).to_string());
        }
        RenderedTime::Utc(dt) => {
            w.line(name, &[], &format!("{}Z", dt.format(DATE_TIME_FORMAT)));
        }
        RenderedTime::Floating(dt) => {
            w.line(name, &[], &dt.format(DATE_TIME_FORMAT).to_string());
        }
        RenderedTime::Zoned(dt) => {
            w.line(name, &[("TZID", tzid)], &dt.format(DATE_TIME_FORMAT).to_string());
        }
    }
}

fn write_event(
    w: &mut ContentWriter,
    event: &CanonicalEvent,
    start: DateTime<Tz>,
    strategy: TzStrategy,
    zone: Tz,
) {
    let end = event.end.unwrap_or(start);

    w.begin("VEVENT");
    if !event.uid.is_empty() {
        w.text("UID", &event.uid);
    }
    w.text("SUMMARY", &event.summary);
    if !event.location.is_empty() {
        w.text("LOCATION", &event.location);
    }
    if !event.description.is_empty() {
        w.text("DESCRIPTION", &event.description);
    }
    write_time(w, "DTSTART", render_instant(start, event.all_day, strategy, zone), zone.name());
    write_time(w, "DTEND", render_instant(end, event.all_day, strategy, zone), zone.name());
    if !event.status.is_empty() {
        w.text("STATUS", &event.status);
    }
    if !event.transparency.is_empty() {
        w.text("TRANSP", &event.transparency);
    }
    if let Some(categories) = event.categories.as_ref().filter(|c| !c.is_empty()) {
        w.text_list("CATEGORIES", categories);
    }
    w.end("VEVENT");
}

impl NormalizedDocument {
    /// Serializes the document as an iCalendar byte stream.
    pub fn to_ics(&self, strategy: TzStrategy) -> Vec<u8> {
        let zone = self.zone();
        let mut w = ContentWriter::new();

        w.begin("VCALENDAR");
        w.text("PRODID", PRODUCT_ID);
        w.text("VERSION", "2.0");
        w.text("CALSCALE", "GREGORIAN");
        w.text("X-WR-CALNAME", self.name());
        w.text("X-WR-TIMEZONE", self.tzid());

        if let Some(block) = ZoneBlock::for_strategy(strategy, zone) {
            block.write(&mut w);
        }

        let mut emitted = 0usize;
        for event in self.events() {
            let Some(start) = event.start else {
                continue;
            };
            write_event(&mut w, event, start, strategy, zone);
            emitted += 1;
        }
        w.end("VCALENDAR");

        debug!(
            emitted,
            skipped = self.events().len() - emitted,
            strategy = %strategy,
            tzid = self.tzid(),
            "Serialized calendar document"
        );

        w.finish().into_bytes()
    }
}

/// Sorts `events` into output order and serializes them.
///
/// Events without a start are dropped from the output.
pub fn serialize(
    events: &[CanonicalEvent],
    document_name: &str,
    zone: Tz,
    strategy: TzStrategy,
) -> Vec<u8> {
    NormalizedDocument::new(document_name, zone, events.to_vec()).to_ics(strategy)
}
