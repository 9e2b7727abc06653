//! Extraction of `noscript` elements from saved page captures.

use anyhow::{Context, Result};
use scraper::{ElementRef, Html, Selector};
use std::fs;
use std::path::Path;

use crate::tag::Tag;

/// Extracts every `noscript` element of a saved capture, wherever the
/// parser placed it.
///
/// The parser runs with scripting enabled, so noscript content arrives as a
/// single raw text node. That text is parsed again as a body fragment to
/// recover the element children. Content that already parsed as markup is
/// walked directly.
pub fn parse_noscript_elements(html: &str) -> Vec<Tag> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("noscript") else {
        return Vec::new();
    };

    document.select(&selector).map(noscript_tag).collect()
}

fn noscript_tag(noscript: ElementRef<'_>) -> Tag {
    let mut tag = Tag::new("noscript");
    for (name, value) in noscript.value().attrs() {
        tag = tag.with_attr(name, value);
    }

    let parsed: Vec<Tag> = noscript
        .children()
        .filter_map(ElementRef::wrap)
        .map(Tag::from_element)
        .collect();
    if !parsed.is_empty() {
        return parsed.into_iter().fold(tag, Tag::with_child);
    }

    let raw: String = noscript.text().collect();
    let fragment = Html::parse_fragment(&raw);
    let children: Vec<Tag> = fragment
        .root_element()
        .children()
        .filter_map(ElementRef::wrap)
        .map(Tag::from_element)
        .collect();

    // text-only content keeps its text but has no element children
    if children.is_empty() {
        return tag.with_text(&fragment.root_element().text().collect::<String>());
    }
    children.into_iter().fold(tag, Tag::with_child)
}

pub fn load_noscript_elements(path: &Path) -> Result<Vec<Tag>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read noscript capture {:?}", path))?;
    Ok(parse_noscript_elements(&content))
}
