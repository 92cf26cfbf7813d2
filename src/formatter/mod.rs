//! Rewriting raw caption text into readable prose with a language model.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

pub mod openai;

use crate::utils::truncate_chars;
use openai::{ChatRequest, Message};

/// Model used for every formatting request
pub const MODEL: &str = "gpt-4-turbo-preview";

/// Characters of raw transcript sent to the model
pub const MAX_INPUT_CHARS: usize = 15_000;

pub const TEMPERATURE: f32 = 0.5;

pub const MAX_OUTPUT_TOKENS: u32 = 3000;

/// Upper bound on a single language-model call
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub const SYSTEM_PROMPT: &str =
    "Format transcript with proper paragraphs and punctuation. Preserve original wording exactly. No markdown.";

/// Failures reported by a language model client
#[derive(thiserror::Error, Debug)]
pub enum CompletionError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

/// A chat-completion capable language model
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Run `request` with `api_key` and return the completion text
    async fn complete(&self, api_key: &str, request: &ChatRequest) -> Result<String, CompletionError>;
}

/// Why a transcript could not be formatted.
///
/// The `Display` text is the sentence shown to the user.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatFailure {
    #[error("OpenAI API key not configured")]
    MissingCredential,

    #[error("Failed to process transcript")]
    Provider,

    #[error("Formatting failed")]
    Unknown,

    /// The model answered with no text
    #[error("Processing error")]
    EmptyCompletion,
}

impl FormatFailure {
    /// Stable tag used in logs
    pub fn code(&self) -> &'static str {
        match self {
            FormatFailure::MissingCredential => "no-api-key",
            FormatFailure::Provider => "openai",
            FormatFailure::Unknown => "unknown",
            FormatFailure::EmptyCompletion => "empty-completion",
        }
    }
}

impl From<&CompletionError> for FormatFailure {
    fn from(error: &CompletionError) -> Self {
        match error {
            CompletionError::Network(_) | CompletionError::Timeout | CompletionError::Api { .. } => {
                FormatFailure::Provider
            }
            CompletionError::Parse(_) => FormatFailure::Unknown,
        }
    }
}

/// Build the fixed formatting request for `transcript`, truncating it first
pub fn build_request(transcript: &str) -> ChatRequest {
    let excerpt = truncate_chars(transcript, MAX_INPUT_CHARS);

    ChatRequest {
        model: MODEL.to_string(),
        messages: vec![
            Message::system(SYSTEM_PROMPT),
            Message::user(format!("Format this transcript:\n\n{}", excerpt)),
        ],
        temperature: TEMPERATURE,
        max_tokens: MAX_OUTPUT_TOKENS,
    }
}

/// Formats raw transcripts, holding the credential read at startup
#[derive(Clone)]
pub struct TranscriptFormatter {
    model: Arc<dyn LanguageModel>,
    api_key: Option<String>,
}

impl TranscriptFormatter {
    pub fn new(model: Arc<dyn LanguageModel>, api_key: Option<String>) -> Self {
        Self {
            model,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        }
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    /// Rewrite `transcript` into paragraphs without changing its wording
    pub async fn format(&self, transcript: &str) -> Result<String, FormatFailure> {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::warn!("OpenAI API key not configured; skipping formatting");
            return Err(FormatFailure::MissingCredential);
        };

        let request = build_request(transcript);
        let truncated = transcript.chars().count() > MAX_INPUT_CHARS;
        tracing::debug!(model = MODEL, truncated, "Requesting transcript formatting");

        match self.model.complete(api_key, &request).await {
            Ok(content) => {
                let content = content.trim();
                if content.is_empty() {
                    tracing::error!(tag = FormatFailure::EmptyCompletion.code(), "OpenAI Error: empty completion");
                    return Err(FormatFailure::EmptyCompletion);
                }
                Ok(content.to_string())
            }
            Err(error) => {
                let failure = FormatFailure::from(&error);
                tracing::error!(tag = failure.code(), "OpenAI Error: {}", error);
                Err(failure)
            }
        }
    }
}
