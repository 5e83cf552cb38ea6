// src/fetch/article.rs

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace, warn};

use crate::wiki::Document;

static CONTENT: Lazy<Selector> =
    Lazy::new(|| Selector::parse("#mw-content-text").expect("content selector should parse"));
static WITH_ID: Lazy<Selector> =
    Lazy::new(|| Selector::parse("[id]").expect("id selector should parse"));

/// A rendered article with the heading blocks for a set of anchors.
///
/// Body and fragments come from the same parsed tree, so every fragment is
/// serialized exactly as it appears inside the body.
#[derive(Debug, Clone)]
pub struct Article {
    body: String,
    fragments: HashMap<String, String>,
}

impl Article {
    pub fn parse<'a>(raw_html: &str, anchors: impl IntoIterator<Item = &'a str>) -> Self {
        let doc = Html::parse_document(raw_html);
        let body = match doc.select(&CONTENT).next() {
            Some(content) => content.html(),
            None => {
                warn!("no #mw-content-text block, using whole document");
                doc.root_element().html()
            }
        };

        let wanted: HashSet<&str> = anchors.into_iter().collect();
        let mut fragments = HashMap::with_capacity(wanted.len());
        for el in doc.select(&WITH_ID) {
            let Some(id) = el.value().id() else { continue };
            if !wanted.contains(id) || fragments.contains_key(id) {
                continue;
            }
            // The heading's parent is the block that holds it and its edit links.
            let block = el.parent().and_then(ElementRef::wrap).unwrap_or(el);
            let fragment = block.html();
            trace!(anchor = id, len = fragment.len(), "heading block");
            fragments.insert(id.to_string(), fragment);
        }

        debug!(
            body_len = body.len(),
            wanted = wanted.len(),
            found = fragments.len(),
            "parsed article"
        );
        Self { body, fragments }
    }
}

impl Document for Article {
    fn body(&self) -> &str {
        &self.body
    }

    fn section_fragment(&self, anchor: &str) -> Option<&str> {
        self.fragments.get(anchor).map(String::as_str)
    }
}
