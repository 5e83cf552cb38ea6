// src/wiki/scanner.rs

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, instrument, warn};

use super::error::ScanError;

const TABLE_OPEN: &str = "<table";
const TABLE_CLOSE: &str = "</table>";

static WIKITABLE_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<table[^>]*\bclass="[^"]*\bwikitable\b[^"]*"[^>]*>"#)
        .expect("wikitable pattern should compile")
});

/// One wikitable carved out of a larger HTML string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableFragment<'a> {
    /// From the wikitable start tag through its matching `</table>`.
    pub html: &'a str,
    /// Byte offset in the scanned input just past the fragment.
    pub end: usize,
    /// False when the input ran out of closing tags before the open and
    /// close counts balanced; `html` then runs to the end of input.
    pub complete: bool,
}

/// Find the first wikitable in `html` and where it structurally ends.
///
/// Tables nested inside cells are skipped over: the fragment only ends once
/// it holds as many `<table` tags as `</table>` tags.
#[instrument(level = "debug", skip(html), fields(html_len = html.len()))]
pub fn next_table(html: &str) -> Result<Option<TableFragment<'_>>, ScanError> {
    let Some(open) = WIKITABLE_START.find(html) else {
        debug!("no wikitable start tag");
        return Ok(None);
    };
    let start = open.start();
    let rest = &html[start..];
    let limit = rest.matches(TABLE_CLOSE).count();

    let mut end = 0;
    let mut attempts = 0;
    while let Some(pos) = rest[end..].find(TABLE_CLOSE) {
        attempts += 1;
        if attempts > limit {
            return Err(ScanError::Runaway { attempts, limit });
        }
        end += pos + TABLE_CLOSE.len();

        let fragment = &rest[..end];
        let opened = fragment.matches(TABLE_OPEN).count();
        let closed = fragment.matches(TABLE_CLOSE).count();
        if opened == closed {
            debug!(start, end = start + end, nested = opened - 1, "table balanced");
            return Ok(Some(TableFragment {
                html: fragment,
                end: start + end,
                complete: true,
            }));
        }
    }

    warn!(start, "unbalanced table, taking rest of input");
    Ok(Some(TableFragment {
        html: rest,
        end: html.len(),
        complete: false,
    }))
}
