//! RawOccurrence to CanonicalEvent conversion.
//!
//! This module handles the transformation from decoded source data
//! ([`RawOccurrence`]) to the canonical representation consumed by the
//! serializer.
//!
//! The conversion:
//! 1. Coerces absent text properties to empty strings
//! 2. Resolves `start`/`end` through the timezone normalizer and converts
//!    them to the target zone
//! 3. Synthesizes a missing `end` from the duration, the all-day flag or
//!    the start itself

use chrono::DateTime;
use chrono_tz::Tz;
use icsnorm_core::zone::{ensure_zoned, to_target_zone};
use icsnorm_core::{CalendarDuration, CanonicalEvent, NormalizeResult, RawTime};
use tracing::debug;

use crate::raw_occurrence::RawOccurrence;

/// Converts a [`RawOccurrence`] to a [`CanonicalEvent`].
///
/// `target_zone` is the output zone; it also anchors bare dates.
/// `default_zone` is attached to naive wall-clock values.
///
/// # Errors
///
/// Fails when a local time cannot be resolved or when end synthesis
/// overflows. Missing optional properties never fail.
pub fn build(
    raw: &RawOccurrence,
    target_zone: Tz,
    default_zone: Tz,
) -> NormalizeResult<CanonicalEvent> {
    let mut all_day = false;
    let mut resolve = |value: &Option<RawTime>| -> NormalizeResult<Option<DateTime<Tz>>> {
        value
            .as_ref()
            .map(|v| {
                let zoned = ensure_zoned(v, default_zone, target_zone)?;
                all_day |= zoned.all_day;
                Ok(to_target_zone(&zoned.instant, target_zone))
            })
            .transpose()
    };
    let start = resolve(&raw.start)?;
    let end = resolve(&raw.end)?;

    let end = match (start, end) {
        (Some(start), None) => Some(synthesize_end(start, raw.duration, all_day)?),
        (_, end) => end,
    };

    Ok(CanonicalEvent {
        uid: text(&raw.uid),
        summary: text(&raw.summary),
        description: text(&raw.description),
        location: text(&raw.location),
        organizer: text(&raw.organizer),
        start,
        end,
        all_day,
        status: text(&raw.status),
        transparency: text(&raw.transparency),
        categories: raw.categories.clone().map(|c| c.into_vec()),
        raw_class: text(&raw.class),
    })
}

/// Converts a batch of occurrences, failing on the first error.
pub fn build_all(
    raws: &[RawOccurrence],
    target_zone: Tz,
    default_zone: Tz,
) -> NormalizeResult<Vec<CanonicalEvent>> {
    let events = raws
        .iter()
        .map(|raw| build(raw, target_zone, default_zone))
        .collect::<NormalizeResult<Vec<_>>>()?;

    debug!(
        count = events.len(),
        unscheduled = events.iter().filter(|e| e.start.is_none()).count(),
        target = target_zone.name(),
        "Built canonical events"
    );
    Ok(events)
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

/// Duration first, then one calendar day for all-day events, else zero length.
///
/// Day parts move the local calendar in the target zone, so `P1D` from 10:00
/// ends at 10:00 even across a DST change.
fn synthesize_end(
    start: DateTime<Tz>,
    duration: Option<CalendarDuration>,
    all_day: bool,
) -> NormalizeResult<DateTime<Tz>> {
    match duration {
        Some(duration) => duration.add_to(start),
        None if all_day => CalendarDuration::days(1).add_to(start),
        None => Ok(start),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw_occurrence::RawCategories;
    use chrono::{Duration, NaiveDate, TimeZone, Utc};
    use chrono_tz::{America::New_York, Europe::Paris, UTC};

    fn naive(y: i32, m: u32, d: u32, h: u32, min: u32) -> RawTime {
        RawTime::Naive(
            NaiveDate::from_ymd_opt(y, m, d)
                .unwrap()
                .and_hms_opt(h, min, 0)
                .unwrap(),
        )
    }

    fn date(y: i32, m: u32, d: u32) -> RawTime {
        RawTime::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    mod fields {
        use super::*;

        #[test]
        fn absent_strings_become_empty() {
            let event = build(&RawOccurrence::default(), Paris, UTC).unwrap();
            assert_eq!(event.uid, "");
            assert_eq!(event.summary, "");
            assert_eq!(event.organizer, "");
            assert_eq!(event.raw_class, "");
            assert!(event.start.is_none());
            assert!(event.end.is_none());
            assert!(event.categories.is_none());
        }

        #[test]
        fn copies_text_properties() {
            let mut raw = RawOccurrence::new("E1")
                .with_summary("Standup")
                .with_location("Room 1")
                .with_status("CONFIRMED");
            raw.class = Some("PRIVATE".into());
            raw.transparency = Some("OPAQUE".into());

            let event = build(&raw, Paris, UTC).unwrap();
            assert_eq!(event.uid, "E1");
            assert_eq!(event.summary, "Standup");
            assert_eq!(event.location, "Room 1");
            assert_eq!(event.status, "CONFIRMED");
            assert_eq!(event.transparency, "OPAQUE");
            assert_eq!(event.raw_class, "PRIVATE");
        }

        #[test]
        fn scalar_categories_become_single_item() {
            let raw = RawOccurrence::new("E1").with_categories(RawCategories::One("Work".into()));
            let event = build(&raw, Paris, UTC).unwrap();
            assert_eq!(event.categories, Some(vec!["Work".to_string()]));

            let raw = RawOccurrence::new("E1")
                .with_categories(RawCategories::Many(vec!["A".into(), "B".into()]));
            let event = build(&raw, Paris, UTC).unwrap();
            assert_eq!(event.categories, Some(vec!["A".to_string(), "B".to_string()]));
        }
    }

    mod zones {
        use super::*;

        #[test]
        fn aware_start_is_converted_to_target() {
            let start = Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap();
            let raw = RawOccurrence::new("E1").with_start(RawTime::from_utc(start));
            let event = build(&raw, Paris, UTC).unwrap();

            let got = event.start.unwrap();
            assert_eq!(got.timezone(), Paris);
            assert_eq!(got, start);
            assert_eq!(got.format("%H:%M").to_string(), "10:00");
        }

        #[test]
        fn naive_start_uses_default_zone() {
            let raw = RawOccurrence::new("E1").with_start(naive(2024, 1, 10, 9, 0));
            let event = build(&raw, Paris, New_York).unwrap();
            assert_eq!(
                event.start.unwrap(),
                New_York.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap()
            );
            assert!(!event.all_day);
        }

        #[test]
        fn date_start_uses_target_zone() {
            let raw = RawOccurrence::new("H1").with_start(date(2024, 1, 12));
            let event = build(&raw, Paris, New_York).unwrap();
            assert!(event.all_day);
            assert_eq!(
                event.start.unwrap(),
                Paris.with_ymd_and_hms(2024, 1, 12, 0, 0, 0).unwrap()
            );
        }

        #[test]
        fn date_end_marks_all_day() {
            let raw = RawOccurrence::new("H1")
                .with_start(naive(2024, 1, 12, 0, 0))
                .with_end(date(2024, 1, 13));
            assert!(build(&raw, Paris, UTC).unwrap().all_day);
        }
    }

    mod end_synthesis {
        use super::*;

        #[test]
        fn duration_wins() {
            let raw = RawOccurrence::new("E1")
                .with_start(naive(2024, 1, 10, 9, 0))
                .with_duration(Duration::minutes(45));
            let event = build(&raw, UTC, UTC).unwrap();
            assert_eq!(event.end.unwrap() - event.start.unwrap(), Duration::minutes(45));
        }

        #[test]
        fn all_day_without_duration_adds_one_day() {
            let raw = RawOccurrence::new("H1").with_start(date(2024, 1, 12));
            let event = build(&raw, Paris, UTC).unwrap();
            assert_eq!(
                event.end.unwrap(),
                Paris.with_ymd_and_hms(2024, 1, 13, 0, 0, 0).unwrap()
            );
        }

        #[test]
        fn all_day_end_stays_on_midnight_across_dst() {
            let raw = RawOccurrence::new("H1").with_start(date(2024, 3, 31));
            let event = build(&raw, Paris, UTC).unwrap();
            assert_eq!(
                event.end.unwrap(),
                Paris.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap()
            );

            let raw = RawOccurrence::new("H2")
                .with_start(date(2024, 3, 30))
                .with_duration(CalendarDuration::days(2));
            let event = build(&raw, Paris, UTC).unwrap();
            assert_eq!(
                event.end.unwrap(),
                Paris.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap()
            );
        }

        #[test]
        fn day_durations_keep_wall_clock_across_dst() {
            let start = RawTime::Zoned(Paris.with_ymd_and_hms(2024, 3, 30, 10, 0, 0).unwrap());
            let raw = RawOccurrence::new("E1")
                .with_start(start)
                .with_duration(CalendarDuration::days(1));
            let event = build(&raw, Paris, Paris).unwrap();
            assert_eq!(
                event.end.unwrap(),
                Paris.with_ymd_and_hms(2024, 3, 31, 10, 0, 0).unwrap()
            );

            let raw = RawOccurrence::new("E2")
                .with_start(start)
                .with_duration(Duration::hours(24));
            let event = build(&raw, Paris, Paris).unwrap();
            assert_eq!(
                event.end.unwrap(),
                Paris.with_ymd_and_hms(2024, 3, 31, 11, 0, 0).unwrap()
            );
        }

        #[test]
        fn timed_without_end_is_zero_length() {
            let raw = RawOccurrence::new("E1").with_start(naive(2024, 1, 10, 9, 0));
            let event = build(&raw, UTC, UTC).unwrap();
            assert_eq!(event.end, event.start);
        }

        #[test]
        fn explicit_end_is_kept() {
            let raw = RawOccurrence::new("E1")
                .with_start(naive(2024, 1, 10, 9, 0))
                .with_end(naive(2024, 1, 10, 9, 30))
                .with_duration(Duration::hours(5));
            let event = build(&raw, UTC, UTC).unwrap();
            assert_eq!(event.end.unwrap() - event.start.unwrap(), Duration::minutes(30));
        }

        #[test]
        fn end_without_start_is_kept_alone() {
            let raw = RawOccurrence::new("E1").with_end(naive(2024, 1, 10, 9, 30));
            let event = build(&raw, UTC, UTC).unwrap();
            assert!(event.start.is_none());
            assert!(event.end.is_some());
            assert!(!event.is_emittable());
        }
    }

    #[test]
    fn build_all_converts_every_occurrence() {
        let raws = vec![
            RawOccurrence::new("A").with_start(naive(2024, 1, 10, 9, 0)),
            RawOccurrence::new("B"),
        ];
        let events = build_all(&raws, Paris, UTC).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].uid, "A");
        assert_eq!(events[1].uid, "B");
    }
}
