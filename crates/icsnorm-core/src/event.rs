//! Canonical event types.
//!
//! This module provides the types flowing out of normalization:
//! - [`CanonicalEvent`]: one occurrence with zone-resolved start/end
//! - [`NormalizedDocument`]: a named, deterministically ordered event set

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// A single normalized occurrence.
///
/// String fields are empty when the source property was absent. `start` and
/// `end` are expressed in the target zone; when `all_day` is set they sit at
/// midnight of a calendar date in that zone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonicalEvent {
    pub uid: String,
    pub summary: String,
    pub description: String,
    pub location: String,
    pub organizer: String,
    /// Start instant. Events without a start are never serialized.
    pub start: Option<DateTime<Tz>>,
    /// End instant, synthesized from the start when the source has none.
    pub end: Option<DateTime<Tz>>,
    pub all_day: bool,
    pub status: String,
    pub transparency: String,
    pub categories: Option<Vec<String>>,
    /// The source `CLASS` value, carried through unchanged.
    pub raw_class: String,
}

impl CanonicalEvent {
    /// Creates an event with the given UID and summary.
    pub fn new(uid: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            summary: summary.into(),
            ..Self::default()
        }
    }

    /// Builder method to set the start and end instants.
    pub fn with_span(mut self, start: DateTime<Tz>, end: Option<DateTime<Tz>>) -> Self {
        self.start = Some(start);
        self.end = end;
        self
    }

    /// Builder method to mark the event as all-day.
    pub fn with_all_day(mut self, all_day: bool) -> Self {
        self.all_day = all_day;
        self
    }

    /// Builder method to set the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// Builder method to set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Builder method to set the status.
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    /// Builder method to set the transparency.
    pub fn with_transparency(mut self, transparency: impl Into<String>) -> Self {
        self.transparency = transparency.into();
        self
    }

    /// Builder method to set the categories.
    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = Some(categories.into_iter().map(Into::into).collect());
        self
    }

    /// Returns true if this event will appear in serialized output.
    pub fn is_emittable(&self) -> bool {
        self.start.is_some()
    }

    /// The start as a UTC instant, used for ordering.
    pub fn start_utc(&self) -> Option<DateTime<Utc>> {
        self.start.map(|dt| dt.with_timezone(&Utc))
    }

    /// Output ordering: by start (missing starts first), then by UID.
    pub fn output_order(&self, other: &Self) -> Ordering {
        self.start_utc()
            .cmp(&other.start_utc())
            .then_with(|| self.uid.cmp(&other.uid))
    }
}

/// A normalized calendar document ready for serialization.
///
/// Built once per request; the event order is fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedDocument {
    name: String,
    zone: Tz,
    ordered_events: Vec<CanonicalEvent>,
}

impl NormalizedDocument {
    /// Creates a document, sorting `events` into output order.
    ///
    /// The sort is stable, so events equal in start and UID keep their
    /// relative input order.
    pub fn new(name: impl Into<String>, zone: Tz, mut events: Vec<CanonicalEvent>) -> Self {
        events.sort_by(CanonicalEvent::output_order);
        Self {
            name: name.into(),
            zone,
            ordered_events: events,
        }
    }

    /// The document display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The target zone.
    pub fn zone(&self) -> Tz {
        self.zone
    }

    /// The target zone identifier.
    pub fn tzid(&self) -> &'static str {
        self.zone.name()
    }

    /// All canonical events in output order, including ones without a start.
    pub fn events(&self) -> &[CanonicalEvent] {
        &self.ordered_events
    }

    /// The events that will be serialized.
    pub fn emittable_events(&self) -> impl Iterator<Item = &CanonicalEvent> {
        self.ordered_events.iter().filter(|e| e.is_emittable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Europe::Paris;

    fn at(h: u32, m: u32) -> DateTime<Tz> {
        Paris.with_ymd_and_hms(2024, 1, 10, h, m, 0).unwrap()
    }

    #[test]
    fn sorts_by_start_then_uid() {
        let a = CanonicalEvent::new("b", "A").with_span(at(10, 0), None);
        let b = CanonicalEvent::new("a", "B").with_span(at(10, 0), None);
        let c = CanonicalEvent::new("z", "C").with_span(at(9, 0), None);

        let doc = NormalizedDocument::new("cal", Paris, vec![a, b, c]);
        let summaries: Vec<_> = doc.events().iter().map(|e| e.summary.as_str()).collect();
        assert_eq!(summaries, ["C", "B", "A"]);
    }

    #[test]
    fn missing_start_sorts_first_but_is_not_emittable() {
        let timed = CanonicalEvent::new("a", "timed").with_span(at(9, 0), None);
        let floating = CanonicalEvent::new("z", "no start");

        let doc = NormalizedDocument::new("cal", Paris, vec![timed, floating]);
        assert_eq!(doc.events().len(), 2);
        assert_eq!(doc.events()[0].summary, "no start");
        assert_eq!(doc.emittable_events().count(), 1);
    }

    #[test]
    fn ordering_compares_instants_across_zones() {
        let paris = CanonicalEvent::new("a", "paris").with_span(at(10, 0), None);
        let utc = CanonicalEvent::new("b", "utc").with_span(
            Tz::UTC.with_ymd_and_hms(2024, 1, 10, 8, 30, 0).unwrap(),
            None,
        );
        // 08:30Z is before 10:00 Paris (09:00Z)
        assert_eq!(utc.output_order(&paris), Ordering::Less);
    }

    #[test]
    fn exposes_tzid() {
        let doc = NormalizedDocument::new("cal", Paris, Vec::new());
        assert_eq!(doc.tzid(), "Europe/Paris");
        assert_eq!(doc.name(), "cal");
    }
}
