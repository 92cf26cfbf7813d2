//! HTML views for the web form.

use crate::transcribe::TranscriptionResult;
use crate::utils::escape_html;

const INDEX_TEMPLATE: &str = include_str!("../../templates/index.html");
const RESULT_TEMPLATE: &str = include_str!("../../templates/result.html");

/// Render the submission form, optionally with an error message above it
pub fn render_form(error: Option<&str>) -> String {
    let error_block = error
        .map(|message| format!("    <p class=\"error\" role=\"alert\">{}</p>", escape_html(message)))
        .unwrap_or_default();

    INDEX_TEMPLATE.replace("{{error}}", &error_block)
}

/// Render the formatted transcript page
pub fn render_result(result: &TranscriptionResult) -> String {
    // Transcript goes in last so its text is never scanned for placeholders
    RESULT_TEMPLATE
        .replace("{{watch_url}}", &escape_html(&result.watch_url))
        .replace("{{video_id}}", &escape_html(result.video_id.as_str()))
        .replace("{{transcript}}", &paragraphs_html(&result.transcript))
}

/// Blank lines separate paragraphs; single newlines become line breaks
fn paragraphs_html(text: &str) -> String {
    text.split("\n\n")
        .map(str::trim)
        .filter(|paragraph| !paragraph.is_empty())
        .map(|paragraph| {
            let lines: Vec<_> = paragraph
                .lines()
                .map(|line| escape_html(line.trim()).into_owned())
                .collect();
            format!("        <p>{}</p>", lines.join("<br>\n"))
        })
        .collect::<Vec<_>>()
        .join("\n")
}
