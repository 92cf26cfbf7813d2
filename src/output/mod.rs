use anyhow::Result;
use std::path::Path;

use crate::cli::OutputFormat;
use crate::transcribe::TranscriptionResult;
use crate::utils::format_duration;

pub mod views;

/// Render a transcription result for the terminal or a file
pub fn render(result: &TranscriptionResult, format: &OutputFormat) -> Result<String> {
    let content = match format {
        OutputFormat::Text => result.transcript.clone(),
        OutputFormat::Json => serde_json::to_string_pretty(result)?,
    };
    Ok(content)
}

/// One-line summary of where a transcript came from
pub fn summary(result: &TranscriptionResult) -> String {
    let mut line = format!(
        "{} ({} caption fragments, {})",
        result.watch_url,
        result.fragment_count,
        format_duration(result.caption_seconds)
    );
    if result.truncated {
        line.push_str(", input truncated");
    }
    line
}

/// Save transcription result to file
pub fn save_to_file(result: &TranscriptionResult, path: &Path, format: &OutputFormat) -> Result<()> {
    let content = render(result, format)?;
    fs_err::write(path, content)?;
    Ok(())
}

/// Print transcription result to console
pub fn print_to_console(result: &TranscriptionResult, format: &OutputFormat) -> Result<()> {
    let content = render(result, format)?;
    println!("{}", content);
    Ok(())
}
