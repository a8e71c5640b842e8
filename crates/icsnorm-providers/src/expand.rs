//! Recurrence expansion.
//!
//! [`RecurrenceExpander`] turns the events of a [`ParsedCalendar`] into the
//! concrete occurrences overlapping a [`TimeWindow`]:
//!
//! - single events are kept when they overlap the window;
//! - masters (`RRULE` and/or `RDATE`) are expanded with the `rrule` crate,
//!   minus their `EXDATE`s;
//! - `RECURRENCE-ID` overrides replace the generated instance they name and
//!   are windowed on their own start/end, so moved instances land where
//!   they were moved to;
//! - events without `DTSTART` are passed through for the builder.
//!
//! Floating and date values have no instant of their own; for windowing they
//! are read as UTC.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use icsnorm_core::{RawTime, TimeWindow};
use rrule::RRuleSet;
use tracing::{debug, trace, warn};

use crate::calendar::{ParsedCalendar, ParsedEvent};
use crate::error::{ProviderError, ProviderResult};
use crate::ics::occurrence_of;
use crate::ics::value::{decode_time, decode_time_list};
use crate::raw_occurrence::RawOccurrence;
use crate::source::OccurrenceExpander;

/// Maximum instances generated per recurring master.
pub const MAX_OCCURRENCES: u16 = 10_000;

/// Expands recurring events with the `rrule` crate.
#[derive(Debug, Clone, Copy)]
pub struct RecurrenceExpander {
    max_occurrences: u16,
}

impl Default for RecurrenceExpander {
    fn default() -> Self {
        Self {
            max_occurrences: MAX_OCCURRENCES,
        }
    }
}

impl RecurrenceExpander {
    /// Creates an expander with the default instance cap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the per-master instance cap.
    pub fn with_max_occurrences(mut self, max: u16) -> Self {
        self.max_occurrences = max;
        self
    }

    fn expand_master(
        &self,
        event: &ParsedEvent,
        master: &RawOccurrence,
        master_start: RawTime,
        window: &TimeWindow,
        overridden: Option<&HashSet<NaiveDateTime>>,
    ) -> ProviderResult<Vec<RawOccurrence>> {
        // instances repeat the master's local length, not its elapsed time
        let length = master.end.map(|end| master_start.wall_clock_until(&end));

        // DTSTART is always the first instance of a series
        let mut starts = vec![master_start];
        if let Some(rule) = event.find("RRULE") {
            let reach = length
                .or(master.duration.map(|d| d.approximate()))
                .unwrap_or_else(Duration::zero);
            starts.extend(self.rule_instances(
                master,
                master_start,
                &rule.value,
                window,
                reach,
            )?);
        }
        starts.extend(event.find_all("RDATE").flat_map(decode_time_list));

        let excluded: HashSet<NaiveDateTime> = event
            .find_all("EXDATE")
            .flat_map(decode_time_list)
            .map(|t| t.comparison_key())
            .collect();

        let mut seen = HashSet::new();
        let mut instances = Vec::new();
        for start in starts {
            let key = start.comparison_key();
            if !seen.insert(key) || excluded.contains(&key) {
                continue;
            }
            if overridden.is_some_and(|keys| keys.contains(&key)) {
                trace!(uid = master.uid_or_empty(), %key, "Instance replaced by override");
                continue;
            }

            let mut instance = master.clone();
            instance.start = Some(start);
            instance.end = match length {
                Some(length) => Some(start.checked_add_wall_clock(length).map_err(|e| {
                    ProviderError::expansion(format!(
                        "Instance end out of range for event '{}': {}",
                        master.uid_or_empty(),
                        e
                    ))
                })?),
                None => None,
            };
            if overlaps(&instance, window) {
                instances.push(instance);
            }
        }
        Ok(instances)
    }

    /// Runs the RRULE over the window, widened by the instance length so
    /// instances starting before the window but still running are found.
    fn rule_instances(
        &self,
        master: &RawOccurrence,
        master_start: RawTime,
        rule: &str,
        window: &TimeWindow,
        reach: Duration,
    ) -> ProviderResult<Vec<RawTime>> {
        let uid = master.uid_or_empty();
        let source = format!(
            "{}\nRRULE:{}",
            rrule_dtstart(&master_start),
            normalize_until(rule)
        );
        let rrule_set: RRuleSet = source.parse().map_err(|e| {
            ProviderError::expansion(format!("Failed to parse RRULE for event '{}': {}", uid, e))
        })?;

        // after/before are exclusive bounds; a DST change can stretch a
        // local length by an hour
        let tz: rrule::Tz = Utc.into();
        let reach = reach.max(Duration::zero()) + Duration::hours(1);
        let after = (window.start - reach - Duration::seconds(1)).with_timezone(&tz);
        let before = (window.end + Duration::seconds(1)).with_timezone(&tz);

        let result = rrule_set.after(after).before(before).all(self.max_occurrences);
        if result.limited {
            warn!(
                uid,
                max = self.max_occurrences,
                "Recurrence expansion hit the instance cap"
            );
        }
        trace!(uid, instances = result.dates.len(), "Expanded RRULE");

        Ok(result
            .dates
            .iter()
            .map(|dt| instance_start(&master_start, dt.with_timezone(&Utc)))
            .collect())
    }
}

impl OccurrenceExpander for RecurrenceExpander {
    fn expand(
        &self,
        calendar: &ParsedCalendar,
        window: &TimeWindow,
    ) -> ProviderResult<Vec<RawOccurrence>> {
        let mut overridden: HashMap<&str, HashSet<NaiveDateTime>> = HashMap::new();
        for event in calendar.events.iter().filter(|e| e.is_override()) {
            let recurrence_id = event.find("RECURRENCE-ID").and_then(decode_time);
            if let (Some(uid), Some(recurrence_id)) = (event.uid(), recurrence_id) {
                overridden
                    .entry(uid)
                    .or_default()
                    .insert(recurrence_id.comparison_key());
            }
        }

        let mut occurrences = Vec::new();
        for event in &calendar.events {
            let occurrence = occurrence_of(event);
            let Some(start) = occurrence.start else {
                occurrences.push(occurrence);
                continue;
            };

            if event.is_override() || !event.is_recurring_master() {
                if overlaps(&occurrence, window) {
                    occurrences.push(occurrence);
                }
                continue;
            }

            let replaced = event.uid().and_then(|uid| overridden.get(uid));
            occurrences.extend(self.expand_master(event, &occurrence, start, window, replaced)?);
        }

        debug!(
            events = calendar.events.len(),
            occurrences = occurrences.len(),
            window_start = %window.start,
            window_end = %window.end,
            "Expanded calendar"
        );
        Ok(occurrences)
    }
}

/// Formats the master start as an rrule `DTSTART` line.
///
/// Floating and date starts are expressed in UTC and read back the same way.
fn rrule_dtstart(start: &RawTime) -> String {
    match start {
        RawTime::Zoned(dt) if dt.timezone() == chrono_tz::UTC => {
            format!("DTSTART:{}", dt.format("%Y%m%dT%H%M%SZ"))
        }
        RawTime::Zoned(dt) => format!(
            "DTSTART;TZID={}:{}",
            dt.timezone().name(),
            dt.format("%Y%m%dT%H%M%S")
        ),
        RawTime::Naive(naive) => format!("DTSTART:{}Z", naive.format("%Y%m%dT%H%M%S")),
        RawTime::Date(date) => format!("DTSTART:{}T000000Z", date.format("%Y%m%d")),
    }
}

/// Converts an rrule instant back to the kind of the master start.
fn instance_start(master_start: &RawTime, instant: DateTime<Utc>) -> RawTime {
    match master_start {
        RawTime::Zoned(dt) => RawTime::Zoned(instant.with_timezone(&dt.timezone())),
        RawTime::Naive(_) => RawTime::Naive(instant.naive_utc()),
        RawTime::Date(_) => RawTime::Date(instant.date_naive()),
    }
}

/// Rewrites a floating or date-only `UNTIL` as UTC, which the rrule crate
/// requires once `DTSTART` carries a zone.
fn normalize_until(rule: &str) -> String {
    rule.trim()
        .split(';')
        .map(|part| match part.split_once('=') {
            Some((key, value))
                if key.eq_ignore_ascii_case("UNTIL") && !value.ends_with(['Z', 'z']) =>
            {
                if value.len() == 8 {
                    format!("UNTIL={}T235959Z", value)
                } else {
                    format!("UNTIL={}Z", value)
                }
            }
            _ => part.to_string(),
        })
        .collect::<Vec<_>>()
        .join(";")
}

/// Reads a raw time as an instant, floating and date values as UTC.
fn as_instant(value: &RawTime) -> DateTime<Utc> {
    Utc.from_utc_datetime(&value.comparison_key())
}

fn overlaps(occurrence: &RawOccurrence, window: &TimeWindow) -> bool {
    let Some(start) = occurrence.start else {
        return true;
    };
    let start_at = as_instant(&start);
    let end_at = match (occurrence.end, occurrence.duration) {
        (Some(end), _) => as_instant(&end),
        (None, Some(duration)) => match start {
            RawTime::Zoned(dt) => duration
                .add_to(dt)
                .map(|end| end.with_timezone(&Utc))
                .unwrap_or(start_at),
            _ => start_at
                .checked_add_signed(duration.approximate())
                .unwrap_or(start_at),
        },
        (None, None) if start.is_date() => start_at + Duration::days(1),
        (None, None) => start_at,
    };
    window.overlaps(start_at, end_at)
}
