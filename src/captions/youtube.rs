use async_trait::async_trait;
use regex::Regex;
use reqwest::header::{ACCEPT_LANGUAGE, COOKIE};
use reqwest::Client;
use serde::Deserialize;
use std::sync::LazyLock;

use super::timedtext::parse_timedtext;
use super::{CaptionError, CaptionFragment, CaptionSource};
use crate::extractors::VideoId;

const CONSENT_FORM_ACTION: &str = "action=\"https://consent.youtube.com/s\"";
const CAPTIONS_MARKER: &str = "\"captions\":";
const VIDEO_DETAILS_MARKER: &str = ",\"videoDetails";

static RE_CONSENT_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"name="v" value="(.*?)""#).unwrap());

/// A caption track advertised on a watch page
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTrack {
    pub base_url: String,
    pub language_code: String,
    /// `"asr"` for auto-generated tracks
    #[serde(default)]
    pub kind: Option<String>,
}

impl CaptionTrack {
    pub fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionsPayload {
    player_captions_tracklist_renderer: Option<TracklistRenderer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TracklistRenderer {
    #[serde(default)]
    caption_tracks: Vec<CaptionTrack>,
}

/// Caption source backed by YouTube's public watch pages
pub struct YoutubeCaptionClient {
    client: Client,
}

impl YoutubeCaptionClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Download the watch page, accepting the cookie consent interstitial if shown
    async fn fetch_watch_page(&self, video_id: &VideoId) -> Result<String, CaptionError> {
        let html = self.get_watch_page(video_id, None).await?;
        if !html.contains(CONSENT_FORM_ACTION) {
            return Ok(html);
        }

        tracing::debug!(video_id = %video_id, "Accepting YouTube consent page");
        let token = consent_token(&html).ok_or(CaptionError::ConsentFailed)?;
        let html = self
            .get_watch_page(video_id, Some(format!("CONSENT=YES+{}", token)))
            .await?;

        if html.contains(CONSENT_FORM_ACTION) {
            return Err(CaptionError::ConsentFailed);
        }
        Ok(html)
    }

    async fn get_watch_page(&self, video_id: &VideoId, cookie: Option<String>) -> Result<String, CaptionError> {
        let mut request = self
            .client
            .get(video_id.watch_url())
            .header(ACCEPT_LANGUAGE, "en-US");

        if let Some(cookie) = cookie {
            request = request.header(COOKIE, cookie);
        }

        let html = request.send().await?.error_for_status()?.text().await?;
        Ok(html)
    }

    /// Download and parse one caption track
    async fn fetch_track(&self, track: &CaptionTrack, preserve_formatting: bool) -> Result<Vec<CaptionFragment>, CaptionError> {
        tracing::debug!(language = %track.language_code, generated = track.is_generated(), "Downloading caption track");

        let url = track.base_url.replace("&fmt=srv3", "");
        let xml = self
            .client
            .get(url)
            .header(ACCEPT_LANGUAGE, "en-US")
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_timedtext(&xml, preserve_formatting)
    }
}

impl Default for YoutubeCaptionClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CaptionSource for YoutubeCaptionClient {
    async fn fetch_captions(
        &self,
        video_id: &VideoId,
        languages: &[String],
        preserve_formatting: bool,
    ) -> Result<Vec<CaptionFragment>, CaptionError> {
        let html = self.fetch_watch_page(video_id).await?;
        let tracks = extract_caption_tracks(&html, video_id)?;
        let track = select_track(&tracks, languages, video_id)?;

        self.fetch_track(track, preserve_formatting).await
    }
}

fn consent_token(html: &str) -> Option<&str> {
    RE_CONSENT_TOKEN
        .captures(html)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
}

/// Pull the advertised caption tracks out of a watch page
pub fn extract_caption_tracks(html: &str, video_id: &VideoId) -> Result<Vec<CaptionTrack>, CaptionError> {
    let Some((_, after)) = html.split_once(CAPTIONS_MARKER) else {
        if html.contains("class=\"g-recaptcha\"") {
            return Err(CaptionError::TooManyRequests);
        }
        if !html.contains("\"playabilityStatus\":") {
            return Err(CaptionError::VideoUnavailable(video_id.to_string()));
        }
        return Err(CaptionError::TranscriptsDisabled(video_id.to_string()));
    };

    let json = after
        .split(VIDEO_DETAILS_MARKER)
        .next()
        .unwrap_or_default()
        .replace('\n', "");

    let payload: CaptionsPayload = serde_json::from_str(&json)
        .map_err(|e| CaptionError::Parse(format!("captions JSON: {}", e)))?;

    match payload.player_captions_tracklist_renderer {
        Some(renderer) if !renderer.caption_tracks.is_empty() => Ok(renderer.caption_tracks),
        _ => Err(CaptionError::TranscriptsDisabled(video_id.to_string())),
    }
}

/// Pick a track by language preference, manual tracks before generated ones
pub fn select_track<'a>(
    tracks: &'a [CaptionTrack],
    languages: &[String],
    video_id: &VideoId,
) -> Result<&'a CaptionTrack, CaptionError> {
    languages
        .iter()
        .find_map(|language| {
            let mut candidates = tracks.iter().filter(|t| &t.language_code == language);
            let manual = candidates.clone().find(|t| !t.is_generated());
            manual.or_else(|| candidates.find(|t| t.is_generated()))
        })
        .ok_or_else(|| CaptionError::NoTranscriptFound {
            video_id: video_id.to_string(),
            requested: languages.to_vec(),
            available: tracks
                .iter()
                .map(|t| {
                    if t.is_generated() {
                        format!("{} (generated)", t.language_code)
                    } else {
                        t.language_code.clone()
                    }
                })
                .collect(),
        })
}
