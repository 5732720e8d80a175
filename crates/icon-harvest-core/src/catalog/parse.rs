//! Tag list and tag detail page parsing.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use super::html;
use crate::config::Flavour;
use crate::error::HarvestError;

/// Link text on the tag list looks like `"Arrows (123)"`. Unanchored, so for
/// multi-line text the line holding the count wins.
fn tag_link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(.+?)\s\(\d+\)").expect("static regex"))
}

/// Normalizes tag link text: drops the `(count)` suffix, trims, lowercases.
pub fn parse_tag_name(link_text: &str) -> String {
    let text = link_text.trim();
    let name = tag_link_re()
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(text);
    name.trim().to_lowercase()
}

/// Maps tag name to detail page href for every link inside a `.tags` element.
///
/// Later duplicates replace earlier ones. Links without an href or with an
/// empty name are ignored.
pub fn parse_tag_list(body: &str) -> BTreeMap<String, String> {
    let mut tags = BTreeMap::new();
    for container in html::elements_with_class(body, "tags") {
        for link in html::anchors(container.inner) {
            let Some(href) = link.href.filter(|h| !h.trim().is_empty()) else {
                continue;
            };
            let name = parse_tag_name(&link.text);
            if name.is_empty() {
                continue;
            }
            tags.insert(name, href);
        }
    }
    tags
}

/// Finds the archive link for `flavour` on a tag detail page.
///
/// The link is the first anchor inside the `.hint--top` element whose
/// `data-hint` is the flavour's hint text, within a `.download` section.
pub fn resolve_flavour_link(body: &str, flavour: Flavour) -> Option<String> {
    let hint = flavour.hint();
    let sections = html::elements_with_class(body, "download");
    let link = sections
        .iter()
        .flat_map(|section| section.descendants())
        .filter(|el| el.has_class("hint--top"))
        .filter(|el| el.attr("data-hint").as_deref() == Some(hint))
        .find_map(|el| {
            html::anchors(el.inner)
                .into_iter()
                .find_map(|a| a.href.filter(|h| !h.trim().is_empty()))
        });
    link
}

/// [`resolve_flavour_link`] that fails with a [`HarvestError::Parse`] naming the tag.
pub fn require_flavour_link(body: &str, tag: &str, flavour: Flavour) -> Result<String, HarvestError> {
    resolve_flavour_link(body, flavour).ok_or_else(|| {
        HarvestError::Parse(format!(
            "tag page '{}' has no download link for flavour {} (\"{}\")",
            tag,
            flavour,
            flavour.hint()
        ))
    })
}
