// src/wiki/date.rs

use chrono::NaiveDate;
use tracing::trace;

use super::error::ExtractError;

/// Literal layout of English release dates, e.g. `May 21, 2019`.
pub const RELEASE_DATE_FORMAT: &str = "%B %d, %Y";

const CELL_CLOSE: &str = "</td";
const DIGITAL_MARKER: &str = "(digital";
const PLACEHOLDERS: &[&str] = &["—", "&mdash;", "TBA"];
const PRINT_MARKERS: &[&str] = &["(physical", "(print"];

/// Reduce the raw markup of a date cell to the bare date text.
///
/// Returns an empty string for placeholders and print-only dates. When a
/// cell lists both a print and a digital date, the digital one is kept.
pub fn normalize_date(cell_html: &str) -> String {
    let mut text = match cell_html.find(CELL_CLOSE) {
        Some(end) => &cell_html[..end],
        None => cell_html,
    };

    if let Some(digital) = text.to_ascii_lowercase().find(DIGITAL_MARKER) {
        text = &text[..digital];
        if let Some(gt) = text.rfind('>') {
            text = &text[gt + 1..];
        }
    }

    if text.starts_with('<') {
        text = match text.find('>') {
            Some(gt) => &text[gt + 1..],
            None => "",
        };
    }

    if let Some(lt) = text.find('<') {
        text = &text[..lt];
    }

    let text = text.trim();
    let lower = text.to_ascii_lowercase();
    if PLACEHOLDERS.contains(&text) || PRINT_MARKERS.iter().any(|m| lower.contains(m)) {
        trace!(cell = %text, "date cell is a non-answer");
        return String::new();
    }

    text.to_string()
}

/// Parse normalized date text. Empty text is "no date", not an error.
pub fn parse_release_date(text: &str) -> Result<Option<NaiveDate>, ExtractError> {
    if text.is_empty() {
        return Ok(None);
    }
    let cleaned = text.replace("&nbsp;", " ").replace('\u{a0}', " ");
    NaiveDate::parse_from_str(cleaned.trim(), RELEASE_DATE_FORMAT)
        .map(Some)
        .map_err(|source| ExtractError::Date {
            text: text.to_string(),
            source,
        })
}
