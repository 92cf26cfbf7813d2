use serde::Serialize;
use std::sync::Arc;

use crate::captions::youtube::YoutubeCaptionClient;
use crate::captions::{CaptionSource, TranscriptFetcher};
use crate::config::Config;
use crate::extractors::{extract_video_id, VideoId};
use crate::formatter::openai::OpenAiClient;
use crate::formatter::{LanguageModel, TranscriptFormatter, MAX_INPUT_CHARS, REQUEST_TIMEOUT};
use crate::RequestError;

/// Formatted transcript with metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptionResult {
    pub video_id: VideoId,

    /// Canonical watch URL of the video
    pub watch_url: String,

    /// The formatted transcript
    pub transcript: String,

    /// Caption fragments that made up the raw transcript
    pub fragment_count: usize,

    /// Seconds of video covered by the captions
    pub caption_seconds: f64,

    /// Whether the raw transcript was cut before formatting
    pub truncated: bool,
}

/// Main transcription pipeline: extract id, fetch captions, format
pub struct TranscriptionPipeline {
    fetcher: TranscriptFetcher,
    formatter: TranscriptFormatter,
}

impl TranscriptionPipeline {
    /// Create a pipeline talking to YouTube and OpenAI
    pub fn new(config: &Config) -> crate::Result<Self> {
        let model = OpenAiClient::new(config.openai.base_url.clone(), REQUEST_TIMEOUT)?;

        Ok(Self::with_collaborators(
            config,
            Arc::new(YoutubeCaptionClient::new()),
            Arc::new(model),
        ))
    }

    /// Create a pipeline over arbitrary caption and language-model collaborators
    pub fn with_collaborators(
        config: &Config,
        captions: Arc<dyn CaptionSource>,
        model: Arc<dyn LanguageModel>,
    ) -> Self {
        Self {
            fetcher: TranscriptFetcher::new(
                captions,
                config.captions.languages.clone(),
                config.captions.preserve_formatting,
            ),
            formatter: TranscriptFormatter::new(model, config.openai.api_key.clone()),
        }
    }

    /// Run one submission through every step, stopping at the first failure
    pub async fn transcribe_from_url(&self, url: &str) -> Result<TranscriptionResult, RequestError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(RequestError::EmptyUrl);
        }

        let video_id = extract_video_id(url).ok_or(RequestError::InvalidUrl)?;
        tracing::info!(video_id = %video_id, "Processing video");

        let raw = self.fetcher.fetch(&video_id).await?;
        let transcript = self.formatter.format(&raw.text).await?;

        tracing::info!(video_id = %video_id, chars = transcript.chars().count(), "Transcript formatted");

        Ok(TranscriptionResult {
            watch_url: video_id.watch_url().to_string(),
            truncated: raw.text.chars().count() > MAX_INPUT_CHARS,
            video_id,
            transcript,
            fragment_count: raw.fragment_count,
            caption_seconds: raw.span_seconds,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::captions::{CaptionError, CaptionFragment, MockCaptionSource};
    use crate::formatter::{CompletionError, MockLanguageModel};
    use tokio_test::{assert_err, assert_ok};

    pub(crate) fn test_config(api_key: Option<&str>) -> Config {
        let mut config = Config::default();
        config.openai.api_key = api_key.map(str::to_string);
        config
    }

    pub(crate) fn captions_returning(texts: &'static [&'static str]) -> MockCaptionSource {
        let mut source = MockCaptionSource::new();
        source.expect_fetch_captions().returning(move |_, _, _| {
            Ok(texts
                .iter()
                .enumerate()
                .map(|(i, text)| CaptionFragment {
                    text: text.to_string(),
                    start: i as f64 * 2.0,
                    duration: 2.0,
                })
                .collect())
        });
        source
    }

    fn pipeline(config: &Config, captions: MockCaptionSource, model: MockLanguageModel) -> TranscriptionPipeline {
        TranscriptionPipeline::with_collaborators(config, Arc::new(captions), Arc::new(model))
    }

    #[tokio::test]
    async fn test_empty_url_skips_everything() {
        let mut captions = MockCaptionSource::new();
        captions.expect_fetch_captions().never();
        let mut model = MockLanguageModel::new();
        model.expect_complete().never();

        let pipeline = pipeline(&test_config(Some("sk-test")), captions, model);
        for input in ["", "   ", "\t\n"] {
            let error = assert_err!(pipeline.transcribe_from_url(input).await);
            assert_eq!(error.to_string(), "Please enter a YouTube URL");
        }
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let mut captions = MockCaptionSource::new();
        captions.expect_fetch_captions().never();

        let pipeline = pipeline(&test_config(Some("sk-test")), captions, MockLanguageModel::new());
        let error = assert_err!(pipeline.transcribe_from_url("https://example.com/video").await);
        assert_eq!(error, RequestError::InvalidUrl);
        assert_eq!(error.to_string(), "Invalid YouTube URL format");
    }

    #[tokio::test]
    async fn test_fetch_failure_stops_pipeline() {
        let mut captions = MockCaptionSource::new();
        captions
            .expect_fetch_captions()
            .returning(|id, _, _| Err(CaptionError::TranscriptsDisabled(id.to_string())));
        let mut model = MockLanguageModel::new();
        model.expect_complete().never();

        let pipeline = pipeline(&test_config(Some("sk-test")), captions, model);
        let error = assert_err!(
            pipeline
                .transcribe_from_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ")
                .await
        );
        assert_eq!(error.to_string(), "Subtitles are disabled for this video");
    }

    #[tokio::test]
    async fn test_missing_credential_after_successful_fetch() {
        let mut model = MockLanguageModel::new();
        model.expect_complete().never();

        let pipeline = pipeline(&test_config(None), captions_returning(&["hello", "world"]), model);
        let error = assert_err!(pipeline.transcribe_from_url("https://youtu.be/dQw4w9WgXcQ").await);
        assert_eq!(error.to_string(), "OpenAI API key not configured");
    }

    #[tokio::test]
    async fn test_successful_run() {
        let mut model = MockLanguageModel::new();
        model
            .expect_complete()
            .withf(|_, request| request.messages[1].content.ends_with("hello world"))
            .times(1)
            .returning(|_, _| Ok("Hello, world.".to_string()));

        let pipeline = pipeline(&test_config(Some("sk-test")), captions_returning(&["hello", "world"]), model);
        let result = assert_ok!(
            pipeline
                .transcribe_from_url("  https://www.youtube.com/shorts/dQw4w9WgXcQ  ")
                .await
        );

        assert_eq!(result.video_id.as_str(), "dQw4w9WgXcQ");
        assert_eq!(result.transcript, "Hello, world.");
        assert_eq!(result.watch_url, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
        assert_eq!(result.fragment_count, 2);
        assert_eq!(result.caption_seconds, 4.0);
        assert!(!result.truncated);
    }

    fn caption_error(kind: &str, video_id: &VideoId) -> CaptionError {
        match kind {
            "disabled" => CaptionError::TranscriptsDisabled(video_id.to_string()),
            "not-found" => CaptionError::NoTranscriptFound {
                video_id: video_id.to_string(),
                requested: vec!["en".to_string()],
                available: Vec::new(),
            },
            "unavailable" => CaptionError::VideoUnavailable(video_id.to_string()),
            "rate-limited" => CaptionError::TooManyRequests,
            _ => CaptionError::Parse("unexpected payload".to_string()),
        }
    }

    #[tokio::test]
    async fn test_fetch_failure_messages() {
        let cases = [
            ("disabled", "Subtitles are disabled for this video"),
            ("not-found", "No transcript available for this video"),
            ("unavailable", "Transcript error"),
            ("rate-limited", "Transcript error"),
            ("parse", "Failed to retrieve transcript"),
        ];

        for (kind, message) in cases {
            let mut captions = MockCaptionSource::new();
            captions
                .expect_fetch_captions()
                .returning(move |id, _, _| Err(caption_error(kind, id)));
            let mut model = MockLanguageModel::new();
            model.expect_complete().never();

            let pipeline = pipeline(&test_config(Some("sk-test")), captions, model);
            let error = assert_err!(pipeline.transcribe_from_url("https://youtu.be/dQw4w9WgXcQ").await);
            assert_eq!(error.to_string(), message, "caption failure {}", kind);
        }
    }

    #[tokio::test]
    async fn test_format_failure_messages() {
        let cases: [(fn() -> Result<String, CompletionError>, &str); 5] = [
            (|| Err(CompletionError::Network("connection reset".to_string())), "Failed to process transcript"),
            (|| Err(CompletionError::Timeout), "Failed to process transcript"),
            (
                || Err(CompletionError::Api { status: 500, message: "boom".to_string() }),
                "Failed to process transcript",
            ),
            (|| Err(CompletionError::Parse("bad json".to_string())), "Formatting failed"),
            (|| Ok("   ".to_string()), "Processing error"),
        ];

        for (reply, message) in cases {
            let mut model = MockLanguageModel::new();
            model.expect_complete().times(1).returning(move |_, _| reply());

            let pipeline = pipeline(&test_config(Some("sk-test")), captions_returning(&["some", "words"]), model);
            let error = assert_err!(pipeline.transcribe_from_url("https://youtu.be/dQw4w9WgXcQ").await);
            assert_eq!(error.to_string(), message);
        }
    }
}
