// src/wiki/volumes.rs

use tracing::{debug, info, instrument, warn};

use super::error::ExtractError;
use super::scanner::next_table;
use super::sections::{plan_sections, SectionInfo};
use super::table::parse_table;
use super::VolumeInfo;

const WIKITABLE_MARKER: &str = "wikitable";

/// A fetched article: the rendered body plus the rendered block of each
/// heading, keyed by anchor id. Every fragment must be a substring of the body.
pub trait Document {
    fn body(&self) -> &str;
    fn section_fragment(&self, anchor: &str) -> Option<&str>;
}

/// Per-series overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VolumeOptions {
    /// Article slug to fetch instead of the one derived from the series name.
    pub slug_override: Option<String>,
    /// Stop after this many tables.
    pub tables_to_parse_override: Option<usize>,
}

fn section_offset<D: Document + ?Sized>(
    doc: &D,
    from: usize,
    anchor: &str,
) -> Result<usize, ExtractError> {
    let not_found = || ExtractError::SectionNotFound {
        anchor: anchor.to_string(),
    };
    let fragment = doc.section_fragment(anchor).ok_or_else(not_found)?;
    doc.body()[from..]
        .find(fragment)
        .map(|pos| from + pos)
        .ok_or_else(not_found)
}

/// Pair each wikitable with a title. Extra leading table gets the series name.
fn reconcile_titles(
    series: &str,
    mut titles: Vec<String>,
    tables: usize,
) -> Result<Vec<String>, ExtractError> {
    if titles.len() + 1 == tables {
        debug!(series, "untitled leading table, using series name");
        titles.insert(0, series.to_string());
    } else if titles.len() != tables {
        return Err(ExtractError::TableCountMismatch {
            tables,
            titles: titles.len(),
        });
    }
    Ok(titles)
}

/// Extract every volume listed in the light novel section of `doc`.
///
/// Tables are walked in document order and their rows appended as they
/// come; the source pages list each table newest-first, so the accumulated
/// list is reversed once at the end to come back in ascending order.
#[instrument(level = "info", skip(doc, sections), fields(sections = sections.len()))]
pub fn extract_volumes<D: Document + ?Sized>(
    series: &str,
    doc: &D,
    sections: &[SectionInfo],
    tables_cap: Option<usize>,
) -> Result<Vec<VolumeInfo>, ExtractError> {
    let plan = plan_sections(sections)?;
    let body = doc.body();

    let start = section_offset(doc, 0, &plan.active.anchor)?;
    let end = match &plan.boundary {
        Some(boundary) => section_offset(doc, start, &boundary.anchor)?,
        None => body.len(),
    };
    let span = &body[start..end];

    let table_count = span.matches(WIKITABLE_MARKER).count();
    let titles = reconcile_titles(series, plan.subtitles, table_count)?;
    debug!(start, end, tables = table_count, "light novel span");

    let mut volumes = Vec::new();
    let mut remaining = span;
    for (parsed, title) in titles.iter().enumerate() {
        if tables_cap.is_some_and(|cap| parsed >= cap) {
            debug!(cap = parsed, "table cap reached");
            break;
        }
        let Some(table) = next_table(remaining)? else {
            warn!(title = %title, "no wikitable left for title");
            break;
        };
        volumes.extend(parse_table(title, table.html)?);
        remaining = &remaining[table.end..];
    }

    volumes.reverse();
    info!(count = volumes.len(), "extracted volumes");
    Ok(volumes)
}
