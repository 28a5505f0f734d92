//! Host page scanning
//!
//! The server renders the dashboard page with the bootstrap payload in an
//! attribute of a known element, HTML-escaped:
//!
//! ```html
//! <div id="app" data-bootstrap="{&quot;dashboard_data&quot;: ...}"></div>
//! ```
//!
//! This is a start-tag scanner, not an HTML parser. It finds the element by
//! id and reads one attribute, which is all the bootstrap needs. Comments and
//! the bodies of `<script>` and `<style>` are not markup, so they are dropped
//! before scanning; their own start tags stay visible.

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// A start tag with its decoded attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attributes: HashMap<String, String>,
}

impl Element {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// A host page loaded into memory
#[derive(Debug, Clone)]
pub struct HostPage {
    html: String,
}

fn opaque_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // An unterminated comment or raw-text element runs to end of input
        Regex::new(
            r"(?is)<!--.*?(?:-->|\z)|(<script\b[^>]*>).*?(?:</script\s*>|\z)|(<style\b[^>]*>).*?(?:</style\s*>|\z)",
        )
        .expect("opaque content pattern is valid")
    })
}

fn start_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // Quoted attribute values may contain '>' so they are matched as units
        Regex::new(r#"<([A-Za-z][A-Za-z0-9-]*)((?:\s+[^\s"'>/=]+(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'>]+))?)*)\s*/?>"#)
            .expect("start tag pattern is valid")
    })
}

fn attribute_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"([^\s"'>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+)))?"#)
            .expect("attribute pattern is valid")
    })
}

fn entity_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|quot|amp|lt|gt|apos);")
            .expect("entity pattern is valid")
    })
}

impl HostPage {
    pub fn new(html: impl AsRef<str>) -> Self {
        let html = opaque_regex()
            .replace_all(html.as_ref(), |caps: &regex::Captures| {
                caps.get(1)
                    .or_else(|| caps.get(2))
                    .map_or_else(String::new, |open| open.as_str().to_string())
            })
            .into_owned();
        Self { html }
    }

    /// First element whose `id` attribute equals `id`
    pub fn element_by_id(&self, id: &str) -> Option<Element> {
        self.elements().find(|e| e.attribute("id") == Some(id))
    }

    /// All start tags in document order
    pub fn elements(&self) -> impl Iterator<Item = Element> + '_ {
        start_tag_regex().captures_iter(&self.html).map(|caps| {
            let tag = caps[1].to_ascii_lowercase();
            let attributes = caps
                .get(2)
                .map(|m| parse_attributes(m.as_str()))
                .unwrap_or_default();
            Element { tag, attributes }
        })
    }
}

fn parse_attributes(raw: &str) -> HashMap<String, String> {
    attribute_regex()
        .captures_iter(raw)
        .map(|caps| {
            let name = caps[1].to_ascii_lowercase();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| unescape(m.as_str()))
                .unwrap_or_default();
            (name, value)
        })
        .collect()
}

/// Decode the character references a template engine emits
pub fn unescape(raw: &str) -> String {
    entity_regex()
        .replace_all(raw, |caps: &regex::Captures| {
            let entity = &caps[1];
            let decoded = match entity {
                "quot" => Some('"'),
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "apos" => Some('\''),
                _ if entity.starts_with("#x") || entity.starts_with("#X") => {
                    u32::from_str_radix(&entity[2..], 16).ok().and_then(char::from_u32)
                }
                _ => entity[1..].parse::<u32>().ok().and_then(char::from_u32),
            };
            // Unknown code points are left as written
            decoded.map_or_else(|| caps[0].to_string(), |c| c.to_string())
        })
        .into_owned()
}
