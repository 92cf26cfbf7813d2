//! Video identifier extraction from user-supplied YouTube URLs.

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;
use url::Url;

/// Length of every YouTube video identifier
pub const VIDEO_ID_LEN: usize = 11;

/// An 11-character YouTube video identifier.
///
/// Only shape is checked; whether the video exists is discovered when
/// captions are requested.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    /// Accept `candidate` if it is exactly 11 characters of `[0-9A-Za-z_-]`
    pub fn parse(candidate: &str) -> Option<Self> {
        let valid = candidate.len() == VIDEO_ID_LEN
            && candidate
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');

        valid.then(|| Self(candidate.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical watch page URL for this video
    pub fn watch_url(&self) -> Url {
        Url::parse_with_params("https://www.youtube.com/watch", [("v", self.as_str())])
            .expect("static watch URL is valid")
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// URL shapes we know how to pull an identifier out of
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlShape {
    /// `watch?v=<id>` and any `/<id>` path segment
    QueryParameter,
    /// `youtu.be/<id>`
    ShortLink,
    /// `youtube.com/embed/<id>`
    Embed,
    /// `youtube.com/shorts/<id>`
    Shorts,
}

impl UrlShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            UrlShape::QueryParameter => "query-parameter",
            UrlShape::ShortLink => "short-link",
            UrlShape::Embed => "embed",
            UrlShape::Shorts => "shorts",
        }
    }
}

static RE_QUERY_PARAMETER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:v=|/)([0-9A-Za-z_-]{11})").unwrap());
static RE_SHORT_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"youtu\.be/([0-9A-Za-z_-]{11})").unwrap());
static RE_EMBED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"embed/([0-9A-Za-z_-]{11})").unwrap());
static RE_SHORTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"shorts/([0-9A-Za-z_-]{11})").unwrap());

struct IdPattern {
    shape: UrlShape,
    regex: &'static LazyLock<Regex>,
}

/// Tried in order; the first structural match wins.
static ID_PATTERNS: &[IdPattern] = &[
    IdPattern {
        shape: UrlShape::QueryParameter,
        regex: &RE_QUERY_PARAMETER,
    },
    IdPattern {
        shape: UrlShape::ShortLink,
        regex: &RE_SHORT_LINK,
    },
    IdPattern {
        shape: UrlShape::Embed,
        regex: &RE_EMBED,
    },
    IdPattern {
        shape: UrlShape::Shorts,
        regex: &RE_SHORTS,
    },
];

/// Extract a video identifier and the shape that matched
pub fn match_video_id(url: &str) -> Option<(VideoId, UrlShape)> {
    ID_PATTERNS.iter().find_map(|pattern| {
        let captured = pattern.regex.captures(url)?.get(1)?;
        VideoId::parse(captured.as_str()).map(|id| (id, pattern.shape))
    })
}

/// Extract a video identifier from any supported YouTube URL shape
pub fn extract_video_id(url: &str) -> Option<VideoId> {
    match_video_id(url).map(|(id, shape)| {
        tracing::debug!(video_id = %id, shape = shape.as_str(), "Extracted video id");
        id
    })
}
