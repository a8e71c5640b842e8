//! Golden tests for serialized documents.
//!
//! These tests use insta snapshots to pin the exact output bytes.
//! Run with `cargo insta review` to update snapshots after intentional changes.

use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::{Europe::Paris, Tz};

use crate::event::CanonicalEvent;
use crate::fingerprint::fingerprint;
use crate::ics::{DEFAULT_DOCUMENT_NAME, serialize};
use crate::time::TzStrategy;

/// Create a UTC datetime expressed in Paris time.
fn paris_from_utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Tz> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0)
        .unwrap()
        .with_timezone(&Paris)
}

/// The "Standup" scenario: 09:00-09:30Z on 2024-01-10.
fn standup() -> CanonicalEvent {
    CanonicalEvent::new("E1", "Standup").with_span(
        paris_from_utc(2024, 1, 10, 9, 0),
        Some(paris_from_utc(2024, 1, 10, 9, 30)),
    )
}

fn sample_set() -> Vec<CanonicalEvent> {
    let holiday = CanonicalEvent::new("H1", "Company Holiday")
        .with_span(
            Paris.with_ymd_and_hms(2024, 1, 12, 0, 0, 0).unwrap(),
            Some(Paris.with_ymd_and_hms(2024, 1, 13, 0, 0, 0).unwrap()),
        )
        .with_all_day(true)
        .with_transparency("TRANSPARENT");
    let review = CanonicalEvent::new("R1", "Design review")
        .with_span(
            paris_from_utc(2024, 1, 11, 13, 0),
            Some(paris_from_utc(2024, 1, 11, 14, 0)),
        )
        .with_location("Room 4, 2nd floor")
        .with_status("CONFIRMED")
        .with_categories(["Work", "Design"]);
    let unscheduled = CanonicalEvent::new("U1", "Unscheduled");

    vec![review, holiday, unscheduled, standup()]
}

fn render(events: &[CanonicalEvent], strategy: TzStrategy) -> String {
    let bytes = serialize(events, DEFAULT_DOCUMENT_NAME, Paris, strategy);
    String::from_utf8(bytes).unwrap().replace("\r\n", "\n")
}

#[test]
fn golden_standup_tzid() {
    let output = render(&[standup()], TzStrategy::Tzid);
    insta::assert_snapshot!(output, @r"
    BEGIN:VCALENDAR
    PRODID:-//ICS Normalizer//v1//EN
    VERSION:2.0
    CALSCALE:GREGORIAN
    X-WR-CALNAME:Normalized Calendar
    X-WR-TIMEZONE:Europe/Paris
    BEGIN:VTIMEZONE
    TZID:Europe/Paris
    END:VTIMEZONE
    BEGIN:VEVENT
    UID:E1
    SUMMARY:Standup
    DTSTART;TZID=Europe/Paris:20240110T100000
    DTEND;TZID=Europe/Paris:20240110T103000
    END:VEVENT
    END:VCALENDAR
    ");
}

#[test]
fn golden_standup_utc() {
    let output = render(&[standup()], TzStrategy::Utc);
    insta::assert_snapshot!(output, @r"
    BEGIN:VCALENDAR
    PRODID:-//ICS Normalizer//v1//EN
    VERSION:2.0
    CALSCALE:GREGORIAN
    X-WR-CALNAME:Normalized Calendar
    X-WR-TIMEZONE:Europe/Paris
    BEGIN:VEVENT
    UID:E1
    SUMMARY:Standup
    DTSTART:20240110T090000Z
    DTEND:20240110T093000Z
    END:VEVENT
    END:VCALENDAR
    ");
}

#[test]
fn golden_standup_floating() {
    let output = render(&[standup()], TzStrategy::Floating);
    insta::assert_snapshot!(output, @r"
    BEGIN:VCALENDAR
    PRODID:-//ICS Normalizer//v1//EN
    VERSION:2.0
    CALSCALE:GREGORIAN
    X-WR-CALNAME:Normalized Calendar
    X-WR-TIMEZONE:Europe/Paris
    BEGIN:VEVENT
    UID:E1
    SUMMARY:Standup
    DTSTART:20240110T100000
    DTEND:20240110T103000
    END:VEVENT
    END:VCALENDAR
    ");
}

#[test]
fn golden_mixed_set_tzid() {
    let output = render(&sample_set(), TzStrategy::Tzid);
    insta::assert_snapshot!(output, @r"
    BEGIN:VCALENDAR
    PRODID:-//ICS Normalizer//v1//EN
    VERSION:2.0
    CALSCALE:GREGORIAN
    X-WR-CALNAME:Normalized Calendar
    X-WR-TIMEZONE:Europe/Paris
    BEGIN:VTIMEZONE
    TZID:Europe/Paris
    END:VTIMEZONE
    BEGIN:VEVENT
    UID:E1
    SUMMARY:Standup
    DTSTART;TZID=Europe/Paris:20240110T100000
    DTEND;TZID=Europe/Paris:20240110T103000
    END:VEVENT
    BEGIN:VEVENT
    UID:R1
    SUMMARY:Design review
    LOCATION:Room 4\, 2nd floor
    DTSTART;TZID=Europe/Paris:20240111T140000
    DTEND;TZID=Europe/Paris:20240111T150000
    STATUS:CONFIRMED
    CATEGORIES:Work,Design
    END:VEVENT
    BEGIN:VEVENT
    UID:H1
    SUMMARY:Company Holiday
    DTSTART;VALUE=DATE:20240112
    DTEND;VALUE=DATE:20240113
    TRANSP:TRANSPARENT
    END:VEVENT
    END:VCALENDAR
    ");
}

#[test]
fn golden_mixed_set_utc() {
    let output = render(&sample_set(), TzStrategy::Utc);
    insta::assert_snapshot!(output, @r"
    BEGIN:VCALENDAR
    PRODID:-//ICS Normalizer//v1//EN
    VERSION:2.0
    CALSCALE:GREGORIAN
    X-WR-CALNAME:Normalized Calendar
    X-WR-TIMEZONE:Europe/Paris
    BEGIN:VEVENT
    UID:E1
    SUMMARY:Standup
    DTSTART:20240110T090000Z
    DTEND:20240110T093000Z
    END:VEVENT
    BEGIN:VEVENT
    UID:R1
    SUMMARY:Design review
    LOCATION:Room 4\, 2nd floor
    DTSTART:20240111T130000Z
    DTEND:20240111T140000Z
    STATUS:CONFIRMED
    CATEGORIES:Work,Design
    END:VEVENT
    BEGIN:VEVENT
    UID:H1
    SUMMARY:Company Holiday
    DTSTART;VALUE=DATE:20240112
    DTEND;VALUE=DATE:20240113
    TRANSP:TRANSPARENT
    END:VEVENT
    END:VCALENDAR
    ");
}

#[test]
fn serialization_is_idempotent() {
    let events = sample_set();
    let first = serialize(&events, DEFAULT_DOCUMENT_NAME, Paris, TzStrategy::Tzid);
    let second = serialize(&events, DEFAULT_DOCUMENT_NAME, Paris, TzStrategy::Tzid);
    assert_eq!(first, second);
    assert_eq!(fingerprint(&first), fingerprint(&second));
}

#[test]
fn input_order_does_not_change_output() {
    let mut reversed = sample_set();
    reversed.reverse();
    assert_eq!(
        render(&sample_set(), TzStrategy::Floating),
        render(&reversed, TzStrategy::Floating)
    );
}

#[test]
fn changed_event_changes_fingerprint() {
    let original = serialize(&[standup()], DEFAULT_DOCUMENT_NAME, Paris, TzStrategy::Tzid);
    let mut edited = standup();
    edited.summary = "Standuq".to_string();
    let changed = serialize(&[edited], DEFAULT_DOCUMENT_NAME, Paris, TzStrategy::Tzid);
    assert_ne!(fingerprint(&original), fingerprint(&changed));
}
