//! Parser for YouTube's timed-text caption XML.
//!
//! A track looks like:
//!
//! ```text
//! <transcript>
//!   <text start="0.0" dur="1.54">Hey there</text>
//!   <text start="1.54" dur="4.16">how are &amp;lt;b&amp;gt;you&amp;lt;/b&amp;gt;</text>
//! </transcript>
//! ```
//!
//! Cue text is escaped twice: once by the XML and once more as HTML.

use regex::{Captures, Regex};
use std::sync::LazyLock;

use super::{CaptionError, CaptionFragment};
use crate::utils::unescape_entities;

/// Inline tags kept when formatting is preserved
pub const FORMATTING_TAGS: &[&str] = &[
    "strong", "em", "b", "i", "mark", "small", "del", "ins", "sub", "sup",
];

static RE_TEXT_ELEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<text\b([^>]*?)(?:/>|>(.*?)</text>)").unwrap());
static RE_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bstart="([^"]*)""#).unwrap());
static RE_DUR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"\bdur="([^"]*)""#).unwrap());
static RE_HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</?([a-z][a-z0-9]*)\b[^>]*>").unwrap());

/// Parse a timed-text document into fragments, in document order
pub fn parse_timedtext(xml: &str, preserve_formatting: bool) -> Result<Vec<CaptionFragment>, CaptionError> {
    if !xml.contains("<transcript") && !xml.contains("<text") {
        return Err(CaptionError::Parse(
            "caption track is not a timed-text document".to_string(),
        ));
    }

    let mut fragments = Vec::new();
    for element in RE_TEXT_ELEMENT.captures_iter(xml) {
        let attributes = element.get(1).map_or("", |m| m.as_str());
        let Some(content) = element.get(2).map(|m| m.as_str()).filter(|c| !c.is_empty()) else {
            continue;
        };

        let start = numeric_attribute(&RE_START, attributes, "start")?;
        let duration = numeric_attribute(&RE_DUR, attributes, "dur")?.max(0.0);

        // XML level, then HTML level
        let decoded = unescape_entities(&unescape_entities(content)).into_owned();

        fragments.push(CaptionFragment {
            text: strip_tags(&decoded, preserve_formatting),
            start,
            duration,
        });
    }

    Ok(fragments)
}

fn numeric_attribute(pattern: &Regex, attributes: &str, name: &str) -> Result<f64, CaptionError> {
    match pattern.captures(attributes) {
        None => Ok(0.0),
        Some(captures) => captures[1]
            .parse::<f64>()
            .map_err(|_| CaptionError::Parse(format!("invalid {} attribute: {:?}", name, &captures[1]))),
    }
}

/// Remove markup, keeping [`FORMATTING_TAGS`] when `preserve_formatting` is set
pub fn strip_tags(text: &str, preserve_formatting: bool) -> String {
    RE_HTML_TAG
        .replace_all(text, |tag: &Captures| {
            let name = tag[1].to_ascii_lowercase();
            if preserve_formatting && FORMATTING_TAGS.contains(&name.as_str()) {
                tag[0].to_string()
            } else {
                String::new()
            }
        })
        .into_owned()
}
