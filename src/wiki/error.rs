// src/wiki/error.rs

use thiserror::Error;

/// Internal failure of the table boundary scanner. Never caused by page
/// content alone; seeing one means the matching logic itself is wrong.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScanError {
    #[error("table scan did not terminate: {attempts} extensions exceeds bound of {limit}")]
    Runaway { attempts: usize, limit: usize },
}

/// Structural and format errors raised while extracting volumes.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("invalid colspan value in `{matched}`")]
    Colspan {
        matched: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("no row headers found in table")]
    NoRowHeaders,

    #[error("could not parse release date `{text}`")]
    Date {
        text: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("no light novel section")]
    NoLightNovelSection,

    #[error("table count does not match title count ({tables} tables, {titles} titles)")]
    TableCountMismatch { tables: usize, titles: usize },

    #[error("section `{anchor}` not found in article body")]
    SectionNotFound { anchor: String },

    #[error(transparent)]
    Scan(#[from] ScanError),
}

impl ExtractError {
    /// True for bugs in the extractor rather than problems with the page.
    pub fn is_internal(&self) -> bool {
        matches!(self, ExtractError::Scan(_))
    }
}
