//! Raw occurrence type produced by recurrence expansion.
//!
//! A [`RawOccurrence`] is one concrete instance of a source event, with its
//! property values decoded but not yet normalized: times still carry whatever
//! zone information the source had. The
//! [`build`](crate::normalize::build) step turns it into a
//! [`CanonicalEvent`](icsnorm_core::CanonicalEvent).

use icsnorm_core::{CalendarDuration, RawTime};

/// The `CATEGORIES` value of a source event.
///
/// Sources either provide a list or a single opaque value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawCategories {
    /// A list of category names.
    Many(Vec<String>),
    /// A single value, kept whole.
    One(String),
}

impl RawCategories {
    /// Converts to a list: sequences keep their items, scalars become a
    /// one-element list.
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::Many(items) => items,
            Self::One(item) => vec![item],
        }
    }
}

/// One occurrence of a source event, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawOccurrence {
    pub uid: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub organizer: Option<String>,
    pub status: Option<String>,
    pub transparency: Option<String>,
    pub class: Option<String>,
    pub start: Option<RawTime>,
    pub end: Option<RawTime>,
    /// Signed duration from the source `DURATION` property.
    pub duration: Option<CalendarDuration>,
    pub categories: Option<RawCategories>,
}

impl RawOccurrence {
    /// Creates an occurrence with the given UID.
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: Some(uid.into()),
            ..Self::default()
        }
    }

    /// Builder method to set the summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Builder method to set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Builder method to set the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Builder method to set the status.
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Builder method to set the start.
    pub fn with_start(mut self, start: RawTime) -> Self {
        self.start = Some(start);
        self
    }

    /// Builder method to set the end.
    pub fn with_end(mut self, end: RawTime) -> Self {
        self.end = Some(end);
        self
    }

    /// Builder method to set the duration.
    pub fn with_duration(mut self, duration: impl Into<CalendarDuration>) -> Self {
        self.duration = Some(duration.into());
        self
    }

    /// Builder method to set the categories.
    pub fn with_categories(mut self, categories: RawCategories) -> Self {
        self.categories = Some(categories);
        self
    }

    /// Returns the UID, or an empty string when absent.
    pub fn uid_or_empty(&self) -> &str {
        self.uid.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn categories_into_vec() {
        let many = RawCategories::Many(vec!["Work".into(), "Design".into()]);
        assert_eq!(many.into_vec(), vec!["Work", "Design"]);
        assert_eq!(RawCategories::One("Work".into()).into_vec(), vec!["Work"]);
    }

    #[test]
    fn builder_sets_fields() {
        let occ = RawOccurrence::new("E1")
            .with_summary("Standup")
            .with_duration(Duration::minutes(30));
        assert_eq!(occ.uid_or_empty(), "E1");
        assert_eq!(occ.summary.as_deref(), Some("Standup"));
        assert_eq!(occ.duration, Some(CalendarDuration::exact(Duration::minutes(30))));
        assert!(occ.start.is_none());
        assert_eq!(RawOccurrence::default().uid_or_empty(), "");
    }
}
