// src/wiki/sections.rs

use serde::Deserialize;
use tracing::{debug, trace};

use super::error::ExtractError;

const LIGHT_NOVEL_HEADING: &str = "light novel";

/// One heading from the MediaWiki section outline.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SectionInfo {
    #[serde(rename = "line")]
    pub heading: String,
    #[serde(rename = "toclevel")]
    pub level: u32,
    pub anchor: String,
}

/// Where the light novel section starts and ends, and the headings nested
/// inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionPlan {
    pub active: SectionInfo,
    /// First following section at the same or a shallower level, if any.
    pub boundary: Option<SectionInfo>,
    pub subtitles: Vec<String>,
}

/// Strip a `text > inner < text` wrapper, keeping the displayed inner text.
pub fn display_title(heading: &str) -> String {
    match (heading.find('>'), heading.rfind('<')) {
        (Some(open), Some(close)) if close > open => heading[open + 1..close].trim().to_string(),
        _ => heading.trim().to_string(),
    }
}

fn is_light_novel(heading: &str) -> bool {
    display_title(heading)
        .to_lowercase()
        .starts_with(LIGHT_NOVEL_HEADING)
}

/// Walk the outline and find the light novel section, its boundary and its
/// sub-section titles.
pub fn plan_sections(sections: &[SectionInfo]) -> Result<SectionPlan, ExtractError> {
    let mut active: Option<&SectionInfo> = None;
    let mut boundary = None;
    let mut subtitles = Vec::new();

    for section in sections {
        match active {
            None => {
                if is_light_novel(&section.heading) {
                    trace!(anchor = %section.anchor, level = section.level, "light novel section");
                    active = Some(section);
                }
            }
            Some(current) if section.level <= current.level => {
                boundary = Some(section.clone());
                break;
            }
            Some(_) => subtitles.push(display_title(&section.heading)),
        }
    }

    let active = active.ok_or(ExtractError::NoLightNovelSection)?;
    debug!(
        anchor = %active.anchor,
        boundary = ?boundary.as_ref().map(|s| s.anchor.as_str()),
        subtitles = subtitles.len(),
        "planned sections"
    );
    Ok(SectionPlan {
        active: active.clone(),
        boundary,
        subtitles,
    })
}
