//! iCalendar (RFC 5545) document parsing.
//!
//! [`IcsParser`] unfolds and tokenizes a document with `icalendar`'s line
//! parser and keeps the VEVENT properties as an owned [`ParsedCalendar`].
//! [`occurrence_of`] decodes one parsed event into a [`RawOccurrence`].

pub mod value;

use icalendar::parser::{Component, Property, read_calendar, unfold};
use tracing::debug;

use crate::calendar::{ParsedCalendar, ParsedEvent, ParsedProperty};
use crate::error::{ProviderError, ProviderResult};
use crate::raw_occurrence::{RawCategories, RawOccurrence};
use crate::source::DocumentParser;

use self::value::{decode_duration, decode_time, split_text_list, unescape_text};

/// Parses iCalendar documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct IcsParser;

impl IcsParser {
    /// Creates a parser.
    pub fn new() -> Self {
        Self
    }

    /// Parses a document given as text.
    ///
    /// # Errors
    ///
    /// Returns a parse error when the text has no `VCALENDAR` or does not
    /// follow the content-line grammar.
    pub fn parse_str(&self, content: &str) -> ProviderResult<ParsedCalendar> {
        let content = content.trim_start_matches('\u{feff}');
        if !content
            .lines()
            .any(|line| line.trim().eq_ignore_ascii_case("BEGIN:VCALENDAR"))
        {
            return Err(ProviderError::parse("Document has no VCALENDAR component"));
        }

        let unfolded = unfold(content);
        let calendar = read_calendar(&unfolded)
            .map_err(|e| ProviderError::parse(format!("Malformed calendar: {}", e)))?;

        let mut parsed = ParsedCalendar::default();
        collect(&calendar.components, &mut parsed);

        debug!(
            events = parsed.events.len(),
            timezones = parsed.timezones.len(),
            "Parsed calendar document"
        );
        Ok(parsed)
    }
}

impl DocumentParser for IcsParser {
    fn parse(&self, bytes: &[u8]) -> ProviderResult<ParsedCalendar> {
        self.parse_str(&String::from_utf8_lossy(bytes))
    }
}

/// Walks components, descending into `VCALENDAR` wrappers.
fn collect(components: &[Component<'_>], out: &mut ParsedCalendar) {
    for component in components {
        let name = component.name.to_string();
        if name.eq_ignore_ascii_case("VEVENT") {
            let properties = component.properties.iter().map(convert_property).collect();
            out.events.push(ParsedEvent::new(properties));
        } else if name.eq_ignore_ascii_case("VTIMEZONE") {
            if let Some(tzid) = component.find_prop("TZID") {
                out.timezones.push(tzid.val.to_string());
            }
        } else if name.eq_ignore_ascii_case("VCALENDAR") {
            collect(&component.components, out);
        }
    }
}

fn convert_property(prop: &Property<'_>) -> ParsedProperty {
    let mut parsed = ParsedProperty::new(prop.name.to_string(), prop.val.to_string());
    for param in &prop.params {
        let value = param
            .val
            .as_ref()
            .map(|v| v.to_string().trim_matches('"').to_string())
            .unwrap_or_default();
        parsed = parsed.with_param(param.key.to_string(), value);
    }
    parsed
}

/// Decodes the properties of one event.
///
/// Unparseable time or duration values are treated as absent.
pub fn occurrence_of(event: &ParsedEvent) -> RawOccurrence {
    let text = |name: &str| event.find(name).map(|p| unescape_text(&p.value));

    let categories: Vec<String> = event
        .find_all("CATEGORIES")
        .flat_map(|p| split_text_list(&p.value))
        .collect();
    let has_categories = event.find("CATEGORIES").is_some();

    RawOccurrence {
        uid: text("UID"),
        summary: text("SUMMARY"),
        description: text("DESCRIPTION"),
        location: text("LOCATION"),
        organizer: event.find("ORGANIZER").map(|p| p.value.clone()),
        status: text("STATUS"),
        transparency: text("TRANSP"),
        class: text("CLASS"),
        start: event.find("DTSTART").and_then(decode_time),
        end: event.find("DTEND").and_then(decode_time),
        duration: event.find("DURATION").and_then(|p| decode_duration(&p.value)),
        categories: has_categories.then_some(RawCategories::Many(categories)),
    }
}
