//! Tag catalog: discovered tag names and their detail pages.
//!
//! Parsing is limited to the two page shapes the site serves: the global tag
//! list and a per-tag detail page carrying one download link per flavour.

mod html;
mod parse;

pub use parse::{parse_tag_list, parse_tag_name, require_flavour_link, resolve_flavour_link};

use std::collections::BTreeMap;

/// A named category and the location of its detail page (as scraped, usually site-relative).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub detail_page: String,
}

/// Tag name to detail page. Iterates in name order so logs are reproducible.
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    tags: BTreeMap<String, String>,
}

impl CatalogIndex {
    pub fn new(tags: BTreeMap<String, String>) -> Self {
        Self { tags }
    }

    /// Parses a tag list page body.
    pub fn from_tag_list_page(body: &str) -> Self {
        Self::new(parse_tag_list(body))
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<Tag> {
        self.tags.get(name).map(|page| Tag {
            name: name.to_string(),
            detail_page: page.clone(),
        })
    }

    /// Keeps only the named tags. Unknown names are returned so the caller can report them.
    pub fn retain_names(&mut self, names: &[String]) -> Vec<String> {
        let wanted: Vec<String> = names.iter().map(|n| parse_tag_name(n)).collect();
        let unknown = wanted
            .iter()
            .filter(|n| !self.tags.contains_key(n.as_str()))
            .cloned()
            .collect();
        self.tags.retain(|name, _| wanted.contains(name));
        unknown
    }

    pub fn iter(&self) -> impl Iterator<Item = Tag> + '_ {
        self.tags.iter().map(|(name, page)| Tag {
            name: name.clone(),
            detail_page: page.clone(),
        })
    }
}
