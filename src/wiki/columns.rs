// src/wiki/columns.rs

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use super::error::ExtractError;

pub(crate) const CELL_OPEN: &str = "<td";

static COLSPAN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"colspan=(?:"([^"]*)"|'([^']*)')"#).expect("colspan pattern should compile")
});

/// Cell counts for a single table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnCounts {
    /// Number of `<td` start tags in the row.
    pub literal: usize,
    /// `literal` plus the extra columns contributed by every `colspan`.
    pub effective: usize,
}

/// Count literal data cells and the effective column width of a row.
///
/// Every `colspan="N"` adds `N - 1` columns. An empty value contributes
/// nothing; a non-numeric one is an error carrying the offending match.
pub fn column_counts(row_html: &str) -> Result<ColumnCounts, ExtractError> {
    let literal = row_html.matches(CELL_OPEN).count();
    let mut effective = literal;

    for caps in COLSPAN_RE.captures_iter(row_html) {
        let raw = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().trim())
            .unwrap_or("");
        if raw.is_empty() {
            continue;
        }
        let span: usize = raw.parse().map_err(|source| ExtractError::Colspan {
            matched: caps[0].to_string(),
            source,
        })?;
        effective += span.saturating_sub(1);
    }

    trace!(literal, effective, "counted row columns");
    Ok(ColumnCounts { literal, effective })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_colspan_means_equal_counts() {
        let row = r#"<th scope="row">1</th><td>a</td><td>b</td><td>c</td><td>d</td>"#;
        let counts = column_counts(row).unwrap();
        assert_eq!(counts, ColumnCounts { literal: 4, effective: 4 });
    }

    #[test]
    fn colspan_adds_extra_columns() {
        let row = r#"<td>a</td><td colspan="2">b</td><td>c</td>"#;
        let counts = column_counts(row).unwrap();
        assert_eq!(counts.literal, 3);
        assert_eq!(counts.effective, 4);
    }

    #[test]
    fn single_quoted_and_multiple_colspans_sum() {
        let row = r#"<td colspan='3'>a</td><td colspan="2">b</td>"#;
        let counts = column_counts(row).unwrap();
        assert_eq!(counts, ColumnCounts { literal: 2, effective: 5 });
    }

    #[test]
    fn empty_colspan_is_ignored() {
        let row = r#"<td>a</td><td colspan="">b</td><td>c</td>"#;
        let counts = column_counts(row).unwrap();
        assert_eq!(counts.effective, counts.literal);
    }

    #[test]
    fn non_numeric_colspan_is_an_error() {
        let row = r#"<td colspan="two">a</td>"#;
        match column_counts(row) {
            Err(ExtractError::Colspan { matched, .. }) => {
                assert_eq!(matched, r#"colspan="two""#)
            }
            other => panic!("expected colspan error, got {:?}", other),
        }
    }
}
