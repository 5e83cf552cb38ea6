// src/wiki/mod.rs
//! Release-date extraction from the light novel section of Wikipedia articles.
//!
//! Control flow runs from [`volumes::extract_volumes`] through
//! [`scanner::next_table`] and [`table::parse_table`] down to
//! [`columns::column_counts`] and [`date::normalize_date`] for each row.

pub mod columns;
pub mod date;
pub mod error;
pub mod scanner;
pub mod sections;
pub mod table;
pub mod volumes;

use chrono::NaiveDate;
use serde::Serialize;

pub use error::{ExtractError, ScanError};
pub use sections::{plan_sections, SectionInfo, SectionPlan};
pub use volumes::{extract_volumes, Document, VolumeOptions};

/// A single volume and its English release date, if one is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VolumeInfo {
    pub name: String,
    pub release_date: Option<NaiveDate>,
}
