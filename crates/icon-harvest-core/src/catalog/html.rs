//! Just enough HTML scanning for the two page shapes we read.
//!
//! No DOM: opening tags are matched with regexes, element bodies are found by
//! counting nested tags of the same name.

use regex::Regex;
use std::sync::OnceLock;

fn open_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<([a-zA-Z][a-zA-Z0-9-]*)\b([^>]*)>").expect("static regex"))
}

fn attr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"([a-zA-Z_:][a-zA-Z0-9_:.-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
            .expect("static regex")
    })
}

fn anchor_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<a\b([^>]*)>(.*?)</a\s*>").expect("static regex"))
}

fn markup_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("static regex"))
}

/// An opening tag and the markup between it and its matching close.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Element<'a> {
    attrs: &'a str,
    pub(crate) inner: &'a str,
}

impl<'a> Element<'a> {
    pub(crate) fn attr(&self, name: &str) -> Option<String> {
        attr_value(self.attrs, name)
    }

    pub(crate) fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|c| c.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    /// Elements nested anywhere inside this one.
    pub(crate) fn descendants(&self) -> Vec<Element<'a>> {
        elements(self.inner)
    }
}

/// A link: decoded `href` and its visible text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Anchor {
    pub(crate) href: Option<String>,
    pub(crate) text: String,
}

/// Every element in `html`, in document order. Void or unclosed elements get
/// an empty body.
pub(crate) fn elements(html: &str) -> Vec<Element<'_>> {
    open_tag_re()
        .captures_iter(html)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let name = caps.get(1)?.as_str();
            let attrs = caps.get(2)?.as_str();
            let inner = if attrs.trim_end().ends_with('/') {
                ""
            } else {
                element_body(&html[whole.end()..], name).unwrap_or("")
            };
            Some(Element { attrs, inner })
        })
        .collect()
}

/// Elements carrying `class` among their classes.
pub(crate) fn elements_with_class<'a>(html: &'a str, class: &str) -> Vec<Element<'a>> {
    elements(html)
        .into_iter()
        .filter(|e| e.has_class(class))
        .collect()
}

/// All `<a>` links in `html`.
pub(crate) fn anchors(html: &str) -> Vec<Anchor> {
    anchor_re()
        .captures_iter(html)
        .map(|caps| {
            let attrs = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            let body = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            Anchor {
                href: attr_value(attrs, "href"),
                text: decode_entities(&markup_re().replace_all(body, "")),
            }
        })
        .collect()
}

fn attr_value(attrs: &str, name: &str) -> Option<String> {
    attr_re().captures_iter(attrs).find_map(|caps| {
        let key = caps.get(1)?.as_str();
        if !key.eq_ignore_ascii_case(name) {
            return None;
        }
        let value = caps.get(2).or_else(|| caps.get(3))?.as_str();
        Some(decode_entities(value))
    })
}

fn any_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<(/?)([a-zA-Z][a-zA-Z0-9-]*)\b[^>]*>").expect("static regex"))
}

/// Markup up to the close tag matching an already-consumed `<name ...>`.
fn element_body<'a>(rest: &'a str, name: &str) -> Option<&'a str> {
    let mut depth = 1usize;
    for m in any_tag_re().captures_iter(rest) {
        if !m[2].eq_ignore_ascii_case(name) {
            continue;
        }
        let whole = m.get(0)?;
        if !m[1].is_empty() {
            depth -= 1;
            if depth == 0 {
                return Some(&rest[..whole.start()]);
            }
        } else if !whole.as_str().ends_with("/>") {
            depth += 1;
        }
    }
    None
}

fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_same_name_elements() {
        let html = r#"<div class="outer"><div class="inner">x</div><a href="/y">y</a></div><a href="/z">z</a>"#;
        let outer = elements_with_class(html, "outer");
        assert_eq!(outer.len(), 1);
        let links = anchors(outer[0].inner);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].href.as_deref(), Some("/y"));
    }

    #[test]
    fn class_matching_is_per_word() {
        let html = r#"<ul class="tags-extra"><li>a</li></ul><ul class="big tags"><li>b</li></ul>"#;
        let found = elements_with_class(html, "tags");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].inner, "<li>b</li>");
    }

    #[test]
    fn anchor_text_is_stripped_and_decoded() {
        let links = anchors(r#"<a href='/t/a.html?x=1&amp;y=2'><b>Arrows &amp; Co</b> (12)</a>"#);
        assert_eq!(links[0].href.as_deref(), Some("/t/a.html?x=1&y=2"));
        assert_eq!(links[0].text, "Arrows & Co (12)");
    }

    #[test]
    fn attributes_in_any_order_and_quote_style() {
        let el = &elements(r#"<span data-hint='png' class="hint--top x">in</span>"#)[0];
        assert_eq!(el.attr("data-hint").as_deref(), Some("png"));
        assert!(el.has_class("hint--top"));
        assert_eq!(el.inner, "in");
    }

    #[test]
    fn self_closing_has_empty_body() {
        let els = elements(r#"<img src="a.png"/><p>t</p>"#);
        assert_eq!(els[0].inner, "");
        assert_eq!(els[1].inner, "t");
    }
}
