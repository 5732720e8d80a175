//! URL joining and local filename derivation.
//!
//! Page hrefs are site-relative and resolved against the configured base URL;
//! tag names become archive filenames after sanitizing.

mod sanitize;

pub use sanitize::sanitize_path_component;

use crate::error::HarvestError;

/// Extension of every downloaded tag archive.
pub const ARCHIVE_EXTENSION: &str = "zip";

/// Resolves an href scraped from a page against `base`.
///
/// Absolute hrefs are returned unchanged; `/tags/arrows.html` becomes
/// `<scheme>://<host>/tags/arrows.html`.
pub fn resolve_href(base: &url::Url, href: &str) -> Result<url::Url, HarvestError> {
    base.join(href.trim())
        .map_err(|e| HarvestError::Parse(format!("bad link '{}': {}", href, e)))
}

/// Local archive filename for `tag`, e.g. `arrows.zip`.
///
/// Returns `None` for tags that sanitize to nothing.
pub fn archive_file_name(tag: &str) -> Option<String> {
    let stem = sanitize_path_component(tag);
    if stem.is_empty() {
        None
    } else {
        Some(format!("{}.{}", stem, ARCHIVE_EXTENSION))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_relative_and_absolute() {
        let base = url::Url::parse("http://game-icons.net").unwrap();
        assert_eq!(
            resolve_href(&base, "/tags/arrows.html").unwrap().as_str(),
            "http://game-icons.net/tags/arrows.html"
        );
        assert_eq!(
            resolve_href(&base, "https://cdn.example.org/a.zip").unwrap().as_str(),
            "https://cdn.example.org/a.zip"
        );
    }

    #[test]
    fn resolve_keeps_base_path_prefix_for_relative() {
        let base = url::Url::parse("http://127.0.0.1:8080/site/").unwrap();
        assert_eq!(
            resolve_href(&base, "tags.html").unwrap().as_str(),
            "http://127.0.0.1:8080/site/tags.html"
        );
    }

    #[test]
    fn archive_names() {
        assert_eq!(archive_file_name("arrows").as_deref(), Some("arrows.zip"));
        assert_eq!(archive_file_name("body part").as_deref(), Some("body part.zip"));
        assert_eq!(archive_file_name("a/b").as_deref(), Some("a_b.zip"));
        assert_eq!(archive_file_name(".."), None);
    }
}
