//! Owned, parsed calendar document.
//!
//! The parser produces this tree and the expander consumes it. It keeps only
//! what expansion needs: VEVENT properties with their parameters, plus the
//! TZIDs declared by VTIMEZONE blocks.

/// A content line: `NAME;KEY=VAL:value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedProperty {
    /// Upper-cased property name.
    pub name: String,
    /// Parameters in source order, keys upper-cased.
    pub params: Vec<(String, String)>,
    /// The raw (still escaped) value.
    pub value: String,
}

impl ParsedProperty {
    /// Creates a property without parameters.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            params: Vec::new(),
            value: value.into(),
        }
    }

    /// Builder method to add a parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into().to_ascii_uppercase(), value.into()));
        self
    }

    /// Returns the first value of parameter `key`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

/// A VEVENT component.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedEvent {
    pub properties: Vec<ParsedProperty>,
}

impl ParsedEvent {
    /// Creates an event from its properties.
    pub fn new(properties: Vec<ParsedProperty>) -> Self {
        Self { properties }
    }

    /// Returns the first property named `name`.
    pub fn find(&self, name: &str) -> Option<&ParsedProperty> {
        self.properties.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Returns every property named `name`, in source order.
    pub fn find_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ParsedProperty> + 'a {
        self.properties
            .iter()
            .filter(move |p| p.name.eq_ignore_ascii_case(name))
    }

    /// Returns the raw UID value.
    pub fn uid(&self) -> Option<&str> {
        self.find("UID").map(|p| p.value.as_str())
    }

    /// Returns true if the event carries recurrence rules or extra dates.
    pub fn is_recurring_master(&self) -> bool {
        self.find("RRULE").is_some() || self.find("RDATE").is_some()
    }

    /// Returns true if the event overrides one instance of a series.
    pub fn is_override(&self) -> bool {
        self.find("RECURRENCE-ID").is_some()
    }
}

/// A parsed calendar document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedCalendar {
    /// VEVENT components in source order.
    pub events: Vec<ParsedEvent>,
    /// TZIDs declared by VTIMEZONE components.
    pub timezones: Vec<String>,
}

impl ParsedCalendar {
    /// Creates a calendar from its events.
    pub fn with_events(events: Vec<ParsedEvent>) -> Self {
        Self {
            events,
            ..Self::default()
        }
    }
}
