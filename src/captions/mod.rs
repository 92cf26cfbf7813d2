//! Caption retrieval and normalization into a raw transcript.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub mod timedtext;
pub mod youtube;

use crate::extractors::VideoId;

/// Language codes requested from the captioning service, in preference order
pub const DEFAULT_LANGUAGES: &[&str] = &["en", "es", "fr"];

/// One timed caption fragment as delivered by the captioning service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionFragment {
    /// Caption text
    pub text: String,

    /// Start time in seconds
    pub start: f64,

    /// Display duration in seconds
    pub duration: f64,
}

/// Failures reported by a caption source
#[derive(thiserror::Error, Debug)]
pub enum CaptionError {
    #[error("Subtitles are disabled for video {0}")]
    TranscriptsDisabled(String),

    #[error("No transcript found for video {video_id} in {requested:?} (available: {available:?})")]
    NoTranscriptFound {
        video_id: String,
        requested: Vec<String>,
        available: Vec<String>,
    },

    #[error("Video {0} is unavailable")]
    VideoUnavailable(String),

    #[error("YouTube is rate limiting requests (captcha challenge)")]
    TooManyRequests,

    #[error("Could not accept the YouTube consent page")]
    ConsentFailed,

    #[error("Request to YouTube failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected caption data: {0}")]
    Parse(String),
}

/// Source of timed captions for a video
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CaptionSource: Send + Sync {
    /// Fetch the caption fragments of the first available track in `languages`
    async fn fetch_captions(
        &self,
        video_id: &VideoId,
        languages: &[String],
        preserve_formatting: bool,
    ) -> Result<Vec<CaptionFragment>, CaptionError>;
}

/// Why a transcript could not be retrieved.
///
/// The `Display` text is the sentence shown to the user.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchFailure {
    #[error("Subtitles are disabled for this video")]
    Disabled,

    #[error("No transcript available for this video")]
    NotFound,

    #[error("Failed to retrieve transcript")]
    Unknown,

    /// A typed upstream refusal without a dedicated message
    #[error("Transcript error")]
    Unavailable,
}

impl FetchFailure {
    /// Stable tag used in logs
    pub fn code(&self) -> &'static str {
        match self {
            FetchFailure::Disabled => "transcripts-disabled",
            FetchFailure::NotFound => "no-transcript-found",
            FetchFailure::Unknown => "unknown",
            FetchFailure::Unavailable => "unavailable",
        }
    }
}

impl From<&CaptionError> for FetchFailure {
    fn from(error: &CaptionError) -> Self {
        match error {
            CaptionError::TranscriptsDisabled(_) => FetchFailure::Disabled,
            CaptionError::NoTranscriptFound { .. } => FetchFailure::NotFound,
            CaptionError::VideoUnavailable(_)
            | CaptionError::TooManyRequests
            | CaptionError::ConsentFailed => FetchFailure::Unavailable,
            CaptionError::Http(_) | CaptionError::Parse(_) => FetchFailure::Unknown,
        }
    }
}

/// Raw caption text for one video
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawTranscript {
    /// Fragment texts joined with single spaces, in delivery order
    pub text: String,

    /// Number of caption fragments joined
    pub fragment_count: usize,

    /// End of the last fragment in seconds
    pub span_seconds: f64,
}

impl RawTranscript {
    pub fn from_fragments(fragments: &[CaptionFragment]) -> Self {
        let text = fragments
            .iter()
            .map(|fragment| fragment.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        let span_seconds = fragments
            .iter()
            .map(|fragment| fragment.start + fragment.duration)
            .fold(0.0, f64::max);

        Self {
            text,
            fragment_count: fragments.len(),
            span_seconds,
        }
    }
}

/// Fetches captions and folds them into a [`RawTranscript`]
#[derive(Clone)]
pub struct TranscriptFetcher {
    source: Arc<dyn CaptionSource>,
    languages: Vec<String>,
    preserve_formatting: bool,
}

impl TranscriptFetcher {
    pub fn new(source: Arc<dyn CaptionSource>, languages: Vec<String>, preserve_formatting: bool) -> Self {
        Self {
            source,
            languages,
            preserve_formatting,
        }
    }

    /// Retrieve the transcript for `video_id`.
    ///
    /// Upstream error detail is logged here and reduced to a [`FetchFailure`].
    pub async fn fetch(&self, video_id: &VideoId) -> Result<RawTranscript, FetchFailure> {
        tracing::debug!(
            video_id = %video_id,
            languages = ?self.languages,
            "Requesting captions"
        );

        match self
            .source
            .fetch_captions(video_id, &self.languages, self.preserve_formatting)
            .await
        {
            Ok(fragments) => {
                let transcript = RawTranscript::from_fragments(&fragments);
                tracing::info!(
                    video_id = %video_id,
                    fragments = transcript.fragment_count,
                    chars = transcript.text.chars().count(),
                    "Transcript retrieved"
                );
                Ok(transcript)
            }
            Err(error) => {
                let failure = FetchFailure::from(&error);
                match failure {
                    FetchFailure::Disabled | FetchFailure::NotFound => {
                        tracing::warn!(video_id = %video_id, tag = failure.code(), "{}", error);
                    }
                    FetchFailure::Unknown | FetchFailure::Unavailable => {
                        tracing::error!(video_id = %video_id, tag = failure.code(), "Transcript Error: {}", error);
                    }
                }
                Err(failure)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video_id() -> VideoId {
        VideoId::parse("dQw4w9WgXcQ").unwrap()
    }

    fn fragment(text: &str, start: f64, duration: f64) -> CaptionFragment {
        CaptionFragment {
            text: text.to_string(),
            start,
            duration,
        }
    }

    fn fetcher(source: MockCaptionSource) -> TranscriptFetcher {
        TranscriptFetcher::new(
            Arc::new(source),
            DEFAULT_LANGUAGES.iter().map(|l| l.to_string()).collect(),
            true,
        )
    }

    #[tokio::test]
    async fn test_fragments_joined_in_order() {
        let mut source = MockCaptionSource::new();
        source
            .expect_fetch_captions()
            .withf(|id, languages, preserve| {
                id.as_str() == "dQw4w9WgXcQ"
                    && languages.iter().map(String::as_str).eq(["en", "es", "fr"])
                    && *preserve
            })
            .times(1)
            .returning(|_, _, _| {
                Ok(vec![
                    fragment("never gonna", 0.0, 1.5),
                    fragment("give you up", 1.5, 2.0),
                ])
            });

        let transcript = fetcher(source).fetch(&video_id()).await.unwrap();
        assert_eq!(transcript.text, "never gonna give you up");
        assert_eq!(transcript.fragment_count, 2);
        assert_eq!(transcript.span_seconds, 3.5);
    }

    #[tokio::test]
    async fn test_disabled_captions() {
        let mut source = MockCaptionSource::new();
        source
            .expect_fetch_captions()
            .returning(|id, _, _| Err(CaptionError::TranscriptsDisabled(id.to_string())));

        let failure = fetcher(source).fetch(&video_id()).await.unwrap_err();
        assert_eq!(failure, FetchFailure::Disabled);
        assert_eq!(failure.to_string(), "Subtitles are disabled for this video");
    }

    #[tokio::test]
    async fn test_missing_track() {
        let mut source = MockCaptionSource::new();
        source.expect_fetch_captions().returning(|id, languages, _| {
            Err(CaptionError::NoTranscriptFound {
                video_id: id.to_string(),
                requested: languages.to_vec(),
                available: vec!["de".to_string()],
            })
        });

        let failure = fetcher(source).fetch(&video_id()).await.unwrap_err();
        assert_eq!(failure, FetchFailure::NotFound);
        assert_eq!(failure.to_string(), "No transcript available for this video");
    }

    #[tokio::test]
    async fn test_other_errors_are_opaque() {
        let mut source = MockCaptionSource::new();
        source
            .expect_fetch_captions()
            .returning(|_, _, _| Err(CaptionError::Parse("secret upstream detail".to_string())));

        let failure = fetcher(source).fetch(&video_id()).await.unwrap_err();
        assert_eq!(failure, FetchFailure::Unknown);
        assert_eq!(failure.to_string(), "Failed to retrieve transcript");
    }

    #[test]
    fn test_typed_refusals_map_to_unavailable() {
        assert_eq!(
            FetchFailure::from(&CaptionError::TooManyRequests),
            FetchFailure::Unavailable
        );
        assert_eq!(
            FetchFailure::from(&CaptionError::VideoUnavailable("x".to_string())),
            FetchFailure::Unavailable
        );
        assert_eq!(FetchFailure::Unavailable.to_string(), "Transcript error");
    }

    #[test]
    fn test_empty_fragments() {
        let transcript = RawTranscript::from_fragments(&[]);
        assert_eq!(transcript.text, "");
        assert_eq!(transcript.fragment_count, 0);
        assert_eq!(transcript.span_seconds, 0.0);
    }
}
