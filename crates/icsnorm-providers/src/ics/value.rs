//! Property value decoding (RFC 5545 §3.3).
//!
//! Handles:
//! - DATE and DATE-TIME values: `20240110`, `20240110T090000Z`,
//!   `DTSTART;TZID=Europe/Paris:20240110T100000`, floating `20240110T100000`
//! - comma-separated lists (`EXDATE`, `RDATE`), including `RDATE` periods
//! - DURATION values, signed (`-PT15M`, `P1W`, `P1DT2H`)
//! - TEXT unescaping and `CATEGORIES` splitting

use chrono::{Duration, NaiveDate, NaiveDateTime};
use chrono_tz::Tz;
use icsnorm_core::{CalendarDuration, RawTime};
use icsnorm_core::zone::attach_zone;
use tracing::trace;

use crate::calendar::ParsedProperty;

const DATE_FORMAT: &str = "%Y%m%d";
const DATE_TIME_FORMAT: &str = "%Y%m%dT%H%M%S";

/// Decodes the first time value of a property.
pub fn decode_time(prop: &ParsedProperty) -> Option<RawTime> {
    decode_time_list(prop).into_iter().next()
}

/// Decodes every time value of a (possibly comma-separated) property.
///
/// Unparseable items are skipped.
pub fn decode_time_list(prop: &ParsedProperty) -> Vec<RawTime> {
    let is_date = prop
        .param("VALUE")
        .is_some_and(|v| v.eq_ignore_ascii_case("DATE"));
    let zone = prop.param("TZID").and_then(lookup_zone);

    prop.value
        .split(',')
        .filter_map(|item| {
            // RDATE;VALUE=PERIOD: only the period start matters
            let item = item.split('/').next().unwrap_or(item).trim();
            if item.is_empty() {
                return None;
            }
            let decoded = decode_time_value(item, is_date, zone);
            if decoded.is_none() {
                trace!(property = %prop.name, value = item, "Skipping unparseable time value");
            }
            decoded
        })
        .collect()
}

/// Decodes one DATE or DATE-TIME value.
///
/// A value in a zone unknown to the tz database, or a wall-clock time the
/// zone cannot represent, is kept as a naive value.
pub fn decode_time_value(value: &str, is_date: bool, zone: Option<Tz>) -> Option<RawTime> {
    if is_date || (value.len() == 8 && value.bytes().all(|b| b.is_ascii_digit())) {
        return NaiveDate::parse_from_str(value, DATE_FORMAT)
            .ok()
            .map(RawTime::Date);
    }

    if let Some(utc) = value.strip_suffix(['Z', 'z']) {
        return NaiveDateTime::parse_from_str(utc, DATE_TIME_FORMAT)
            .ok()
            .map(|naive| RawTime::from_utc(naive.and_utc()));
    }

    let naive = NaiveDateTime::parse_from_str(value, DATE_TIME_FORMAT).ok()?;
    match zone {
        Some(tz) => Some(
            attach_zone(naive, tz)
                .map(RawTime::Zoned)
                .unwrap_or(RawTime::Naive(naive)),
        ),
        None => Some(RawTime::Naive(naive)),
    }
}

/// Resolves a `TZID` parameter against the tz database.
///
/// Some producers prefix identifiers with a path such as
/// `/mozilla.org/20050126_1/Europe/Paris`; the trailing `Area/City` is tried
/// as a fallback.
pub fn lookup_zone(tzid: &str) -> Option<Tz> {
    let tzid = tzid.trim().trim_matches('"');
    if let Ok(tz) = tzid.parse::<Tz>() {
        return Some(tz);
    }
    let parts: Vec<&str> = tzid.rsplitn(3, '/').collect();
    if parts.len() >= 2 {
        let candidate = format!("{}/{}", parts[1], parts[0]);
        if let Ok(tz) = candidate.parse::<Tz>() {
            return Some(tz);
        }
    }
    trace!(tzid, "Unknown TZID, treating values as floating");
    None
}

/// Decodes a signed DURATION value.
///
/// Days and weeks stay nominal; hours, minutes and seconds are exact. Year
/// and month designators are not part of the iCalendar grammar and are
/// rejected.
pub fn decode_duration(value: &str) -> Option<CalendarDuration> {
    let value = value.trim();
    let (negative, rest) = match value.as_bytes().first()? {
        b'-' => (true, &value[1..]),
        b'+' => (false, &value[1..]),
        _ => (false, value),
    };

    let duration = match iso8601::duration(rest).ok()? {
        iso8601::Duration::Weeks(weeks) => CalendarDuration::days(i64::from(weeks) * 7),
        iso8601::Duration::YMDHMS {
            year,
            month,
            day,
            hour,
            minute,
            second,
            millisecond,
        } => {
            if year != 0 || month != 0 {
                return None;
            }
            let time = Duration::hours(i64::from(hour))
                + Duration::minutes(i64::from(minute))
                + Duration::seconds(i64::from(second))
                + Duration::milliseconds(i64::from(millisecond));
            CalendarDuration::new(i64::from(day), time)
        }
    };
    Some(if negative { duration.negated() } else { duration })
}

/// Unescapes a TEXT value.
pub fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n' | 'N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Splits a list-valued TEXT property on unescaped commas, unescaping each item.
///
/// Empty items are dropped.
pub fn split_text_list(value: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                current.push(c);
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            ',' => items.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    items.push(current);

    items
        .iter()
        .map(|item| unescape_text(item.trim()))
        .filter(|item| !item.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use chrono_tz::Europe::Paris;

    fn prop(value: &str) -> ParsedProperty {
        ParsedProperty::new("DTSTART", value)
    }

    mod times {
        use super::*;

        #[test]
        fn decodes_utc() {
            assert_eq!(
                decode_time(&prop("20240110T090000Z")),
                Some(RawTime::from_utc(Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap()))
            );
        }

        #[test]
        fn decodes_zoned() {
            let p = prop("20240110T100000").with_param("TZID", "Europe/Paris");
            assert_eq!(
                decode_time(&p),
                Some(RawTime::Zoned(Paris.with_ymd_and_hms(2024, 1, 10, 10, 0, 0).unwrap()))
            );
        }

        #[test]
        fn decodes_floating_and_dates() {
            assert!(matches!(decode_time(&prop("20240110T100000")), Some(RawTime::Naive(_))));
            assert!(matches!(decode_time(&prop("20240110")), Some(RawTime::Date(_))));
            let p = prop("20240110").with_param("VALUE", "DATE");
            assert!(decode_time(&p).unwrap().is_date());
        }

        #[test]
        fn unknown_tzid_is_floating() {
            let p = prop("20240110T100000").with_param("TZID", "Custom Zone");
            assert!(matches!(decode_time(&p), Some(RawTime::Naive(_))));
        }

        #[test]
        fn prefixed_tzid_is_resolved() {
            assert_eq!(lookup_zone("/mozilla.org/20050126_1/Europe/Paris"), Some(Paris));
            assert_eq!(lookup_zone("\"Europe/Paris\""), Some(Paris));
            assert_eq!(lookup_zone("Nowhere"), None);
        }

        #[test]
        fn decodes_lists_and_periods() {
            let p = ParsedProperty::new("EXDATE", "20240111T090000Z,20240112T090000Z");
            assert_eq!(decode_time_list(&p).len(), 2);

            let p =
                ParsedProperty::new("RDATE", "20240115T090000Z/PT1H").with_param("VALUE", "PERIOD");
            assert_eq!(
                decode_time_list(&p),
                vec![RawTime::from_utc(Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap())]
            );
        }

        #[test]
        fn skips_garbage() {
            assert_eq!(decode_time(&prop("tomorrow")), None);
            assert!(decode_time_list(&prop("20240110T090000Z,nope")).len() == 1);
        }
    }

    mod durations {
        use super::*;

        #[test]
        fn decodes_common_forms() {
            assert_eq!(
                decode_duration("PT30M"),
                Some(CalendarDuration::exact(Duration::minutes(30)))
            );
            assert_eq!(
                decode_duration("P1DT2H"),
                Some(CalendarDuration::new(1, Duration::hours(2)))
            );
            assert_eq!(decode_duration("P1W"), Some(CalendarDuration::days(7)));
            assert_eq!(
                decode_duration("-PT15M"),
                Some(CalendarDuration::exact(Duration::minutes(-15)))
            );
        }

        #[test]
        fn keeps_days_apart_from_hours() {
            assert_eq!(decode_duration("P1D"), Some(CalendarDuration::days(1)));
            assert_eq!(
                decode_duration("PT24H"),
                Some(CalendarDuration::exact(Duration::hours(24)))
            );
            assert_ne!(decode_duration("P1D"), decode_duration("PT24H"));
            assert_eq!(decode_duration("-P2D"), Some(CalendarDuration::days(-2)));
        }

        #[test]
        fn rejects_garbage() {
            assert_eq!(decode_duration(""), None);
            assert_eq!(decode_duration("30 minutes"), None);
            assert_eq!(decode_duration("P1M"), None);
        }
    }

    mod text {
        use super::*;

        #[test]
        fn unescapes() {
            assert_eq!(unescape_text("Room 4\\, 2nd floor"), "Room 4, 2nd floor");
            assert_eq!(unescape_text("a\\nb\\Nc"), "a\nb\nc");
            assert_eq!(unescape_text("x\\;y\\\\z"), "x;y\\z");
        }

        #[test]
        fn splits_on_unescaped_commas() {
            assert_eq!(split_text_list("Work,Design"), vec!["Work", "Design"]);
            assert_eq!(split_text_list("a\\,b,c"), vec!["a,b", "c"]);
            assert_eq!(split_text_list("Work,,"), vec!["Work"]);
        }
    }
}
