//! Transcript Formatter - turn YouTube captions into readable prose
//!
//! This library extracts a video identifier from a YouTube URL, downloads the video's
//! caption track and asks an OpenAI model to rewrite the captions into punctuated
//! paragraphs. It backs both a single-page web form and a one-shot CLI.

pub mod captions;
pub mod cli;
pub mod config;
pub mod extractors;
pub mod formatter;
pub mod output;
pub mod server;
pub mod transcribe;
pub mod utils;

pub use captions::{CaptionSource, FetchFailure};
pub use cli::{Cli, Commands, OutputFormat};
pub use config::Config;
pub use extractors::{extract_video_id, VideoId};
pub use formatter::{FormatFailure, LanguageModel};
pub use transcribe::{TranscriptionPipeline, TranscriptionResult};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Why a submission could not be turned into a formatted transcript.
///
/// The `Display` text of every variant is the message shown to the user.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestError {
    #[error("Please enter a YouTube URL")]
    EmptyUrl,

    #[error("Invalid YouTube URL format")]
    InvalidUrl,

    #[error(transparent)]
    Transcript(#[from] FetchFailure),

    #[error(transparent)]
    Formatting(#[from] FormatFailure),
}
