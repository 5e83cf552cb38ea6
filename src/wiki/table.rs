// src/wiki/table.rs

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, instrument, trace, warn};

use super::columns::{column_counts, CELL_OPEN};
use super::date::{normalize_date, parse_release_date};
use super::error::ExtractError;
use super::VolumeInfo;

const ROW_CLOSE: &str = "</tr>";

/// Effective column count → zero-based index of the English release date.
///
/// These are the table shapes seen on light novel articles so far. Any other
/// width means the date column cannot be located.
pub const DATE_COLUMN_BY_WIDTH: &[(usize, usize)] = &[(4, 3), (5, 4), (6, 4)];

static ROW_HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<th[^>]*\bscope="row"[^>]*>(.*?)</th>"#)
        .expect("row header pattern should compile")
});

static TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^>]*>").expect("tag pattern should compile"));

pub fn date_column_index(effective_columns: usize) -> Option<usize> {
    DATE_COLUMN_BY_WIDTH
        .iter()
        .find(|(width, _)| *width == effective_columns)
        .map(|(_, index)| *index)
}

/// Content of the `index`-th data cell (after its start tag), through the
/// end of the row.
fn cell_content(row_html: &str, index: usize) -> Option<&str> {
    let (open, _) = row_html.match_indices(CELL_OPEN).nth(index)?;
    let gt = row_html[open..].find('>')?;
    Some(&row_html[open + gt + 1..])
}

/// Map each row of one wikitable to a volume named `"<prefix> Vol. <row>"`.
///
/// Stops early, keeping what was already collected, at the first row whose
/// shape has no known date column.
#[instrument(level = "debug", skip(table_html), fields(table_len = table_html.len()))]
pub fn parse_table(name_prefix: &str, table_html: &str) -> Result<Vec<VolumeInfo>, ExtractError> {
    let headers: Vec<_> = ROW_HEADER_RE.captures_iter(table_html).collect();
    if headers.is_empty() {
        return Err(ExtractError::NoRowHeaders);
    }
    debug!(rows = headers.len(), "found row headers");

    let mut volumes = Vec::with_capacity(headers.len());
    for caps in headers {
        let (Some(whole), Some(number)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let label = TAG_RE.replace_all(number.as_str(), "");
        let number = label.trim();

        let row_start = whole.start();
        let row_end = table_html[whole.end()..]
            .find(ROW_CLOSE)
            .map(|pos| whole.end() + pos)
            .unwrap_or(table_html.len());
        let row = &table_html[row_start..row_end];

        let counts = column_counts(row)?;
        let index = match date_column_index(counts.effective) {
            Some(index) if index <= counts.literal => index,
            Some(index) => {
                warn!(
                    prefix = name_prefix,
                    row = number,
                    index,
                    literal = counts.literal,
                    "date column past available cells, skipping rest of table"
                );
                break;
            }
            None => {
                warn!(
                    prefix = name_prefix,
                    row = number,
                    columns = counts.effective,
                    "unexpected table layout, skipping rest of table"
                );
                break;
            }
        };

        let release_date = match cell_content(row, index) {
            Some(cell) => parse_release_date(&normalize_date(cell))?,
            None => {
                debug!(row = number, index, "no date cell in row");
                None
            }
        };
        trace!(row = number, date = ?release_date, "mapped row");

        volumes.push(VolumeInfo {
            name: format!("{} Vol. {}", name_prefix, number),
            release_date,
        });
    }

    Ok(volumes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn lookup_table_covers_known_shapes() {
        assert_eq!(date_column_index(4), Some(3));
        assert_eq!(date_column_index(5), Some(4));
        assert_eq!(date_column_index(6), Some(4));
        assert_eq!(date_column_index(3), None);
        assert_eq!(date_column_index(7), None);
    }

    #[test]
    fn four_column_table_reads_index_three() {
        let table = concat!(
            r#"<table class="wikitable"><tbody>"#,
            r#"<tr><th>No.</th><th>Original release date</th><th>Original ISBN</th><th>English release date</th></tr>"#,
            r#"<tr><th scope="row">1</th><td>March 10, 2012</td><td>978-4-04-000000-1</td><td>x</td><td>May 21, 2019<sup>[1]</sup></td></tr>"#,
            r#"<tr><th scope="row">2</th><td>July 10, 2012</td><td>978-4-04-000000-2</td><td>x</td><td>TBA</td></tr>"#,
            r#"</tbody></table>"#,
        );
        let volumes = parse_table("Overlord", table).unwrap();
        assert_eq!(
            volumes,
            vec![
                VolumeInfo {
                    name: "Overlord Vol. 1".into(),
                    release_date: date(2019, 5, 21),
                },
                VolumeInfo {
                    name: "Overlord Vol. 2".into(),
                    release_date: None,
                },
            ]
        );
    }

    #[test]
    fn six_column_table_reads_index_four() {
        let table = concat!(
            r#"<table class="wikitable">"#,
            r#"<tr><th scope="row">3</th><td>Title</td><td>June 1, 2015</td><td>978-4-00-000000-3</td><td>ignored, 2000</td><td><span>August 4, 2020</span></td><td>978-1-00-000000-3</td></tr>"#,
            r#"</table>"#,
        );
        let volumes = parse_table("Series", table).unwrap();
        assert_eq!(volumes.len(), 1);
        assert_eq!(volumes[0].release_date, date(2020, 8, 4));
    }

    #[test]
    fn unknown_width_stops_without_error() {
        let table = concat!(
            r#"<table class="wikitable">"#,
            r#"<tr><th scope="row">1</th><td>a</td><td>b</td><td>c</td><td>January 5, 2021</td></tr>"#,
            r#"<tr><th scope="row">2</th><td>a</td><td>b</td><td>c</td><td>d</td><td>e</td><td>f</td><td>g</td></tr>"#,
            r#"<tr><th scope="row">3</th><td>a</td><td>b</td><td>c</td><td>March 5, 2021</td></tr>"#,
            r#"</table>"#,
        );
        let volumes = parse_table("S", table).unwrap();
        assert_eq!(volumes.len(), 1);
        assert_eq!(volumes[0].name, "S Vol. 1");
        assert_eq!(volumes[0].release_date, date(2021, 1, 5));
    }

    #[test]
    fn date_index_past_literal_cells_stops_without_error() {
        let table = concat!(
            r#"<table class="wikitable">"#,
            r#"<tr><th scope="row">1</th><td>a</td><td>b</td><td>c</td><td>d</td><td>September 9, 2021</td><td>f</td></tr>"#,
            r#"<tr><th scope="row">2</th><td colspan="4">x</td><td>y</td><td>z</td></tr>"#,
            r#"<tr><th scope="row">3</th><td>a</td><td>b</td><td>c</td><td>d</td><td>October 9, 2021</td><td>f</td></tr>"#,
            r#"</table>"#,
        );
        let volumes = parse_table("S", table).unwrap();
        assert_eq!(
            volumes,
            vec![VolumeInfo {
                name: "S Vol. 1".into(),
                release_date: date(2021, 9, 9),
            }]
        );
    }

    #[test]
    fn header_markup_is_stripped_from_names() {
        let table = concat!(
            r#"<table class="wikitable">"#,
            r##"<tr><th scope="row"><a href="#vol1"><b>1</b></a></th><td>a</td><td>b</td><td>c</td><td>TBA</td></tr>"##,
            r#"</table>"#,
        );
        let volumes = parse_table("S", table).unwrap();
        assert_eq!(volumes[0].name, "S Vol. 1");
    }

    #[test]
    fn row_end_stops_at_next_row() {
        // Chapter-list rows between volumes must not leak cells into the volume row.
        let table = concat!(
            r#"<table class="wikitable">"#,
            r#"<tr><th scope="row">1</th><td>a</td><td>b</td><td>c</td><td>February 2, 2022</td></tr>"#,
            r#"<tr><td colspan="4"><table><tr><td>Chapter 1</td><td>Chapter 2</td></tr></table></td></tr>"#,
            r#"</table>"#,
        );
        let volumes = parse_table("S", table).unwrap();
        assert_eq!(volumes.len(), 1);
        assert_eq!(volumes[0].release_date, date(2022, 2, 2));
    }

    #[test]
    fn non_numeric_header_without_date_cell() {
        let table = concat!(
            r#"<table class="wikitable">"#,
            r#"<tr><th scope="row"> Archive </th><td colspan="3">Collected shorts</td><td>a</td><td>b</td><td>c</td></tr>"#,
            r#"</table>"#,
        );
        let volumes = parse_table("Series", table).unwrap();
        assert_eq!(
            volumes,
            vec![VolumeInfo {
                name: "Series Vol. Archive".into(),
                release_date: None,
            }]
        );
    }

    #[test]
    fn missing_row_headers_is_an_error() {
        let table = r#"<table class="wikitable"><tr><td>1</td></tr></table>"#;
        assert!(matches!(
            parse_table("S", table),
            Err(ExtractError::NoRowHeaders)
        ));
    }

    #[test]
    fn malformed_date_is_surfaced() {
        let table = r#"<table class="wikitable"><tr><th scope="row">1</th><td>a</td><td>b</td><td>c</td><td>2019-05-21</td></tr></table>"#;
        assert!(matches!(
            parse_table("S", table),
            Err(ExtractError::Date { .. })
        ));
    }
}
