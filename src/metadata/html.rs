//! Pattern-based extraction of Open Graph and plain meta tags.
//!
//! Missing tags are never an error: every lookup returns `None` when
//! nothing matches.

use std::sync::LazyLock;

use regex::Regex;

use crate::Metadata;
use crate::models::non_empty;

static META_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<meta\b[^>]*>").expect("meta pattern is valid"));

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)([a-z][a-z0-9:_-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("attribute pattern is valid")
});

static TITLE_ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<title[^>]*>([^<]+)</title>").expect("title pattern is valid")
});

/// Extracts page metadata from an HTML document.
///
/// Uses `og:title` (falling back to the `<title>` element), `og:description`
/// (falling back to `description`), `og:image`, `og:site_name` and the plain
/// `author` meta tag.
pub fn extract_metadata(html: &str) -> Metadata {
    Metadata {
        title: meta_content(html, "og:title").or_else(|| title_element(html)),
        description: meta_content(html, "og:description")
            .or_else(|| meta_content(html, "description")),
        thumbnail: meta_content(html, "og:image"),
        author: meta_content(html, "author"),
        site_name: meta_content(html, "og:site_name"),
    }
}

/// Finds the `content` of a `<meta>` tag keyed by `property` or `name`.
///
/// Attributes may appear in any order and be quoted with `"` or `'`. The key
/// is compared case-insensitively.
pub fn meta_content(html: &str, key: &str) -> Option<String> {
    META_TAG.find_iter(html).find_map(|tag| {
        let mut matched = false;
        let mut content = None;
        for caps in ATTRIBUTE.captures_iter(tag.as_str()) {
            let value = caps.get(2).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
            match caps[1].to_ascii_lowercase().as_str() {
                "property" | "name" if value.trim().eq_ignore_ascii_case(key) => matched = true,
                "content" => content = Some(value),
                _ => {}
            }
        }
        if matched {
            content.and_then(|raw| non_empty(decode_entities(raw)))
        } else {
            None
        }
    })
}

/// Text of the first `<title>` element.
pub fn title_element(html: &str) -> Option<String> {
    TITLE_ELEMENT
        .captures(html)
        .and_then(|caps| caps.get(1))
        .and_then(|m| non_empty(decode_entities(m.as_str())))
}

/// Decodes the handful of entities common in attribute values.
fn decode_entities(raw: &str) -> String {
    raw.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
