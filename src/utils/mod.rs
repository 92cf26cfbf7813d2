use std::borrow::Cow;

/// Escape text for interpolation into HTML element content or attribute values
pub fn escape_html(input: &str) -> Cow<'_, str> {
    html_escape::encode_quoted_attribute(input)
}

/// Decode HTML character references, including the full named-entity set.
///
/// Unknown or malformed references are left untouched.
pub fn unescape_entities(input: &str) -> Cow<'_, str> {
    html_escape::decode_html_entities(input)
}

/// Keep at most `max_chars` characters of `input`, never splitting a character
pub fn truncate_chars(input: &str, max_chars: usize) -> &str {
    match input.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &input[..byte_index],
        None => input,
    }
}

/// Format duration in human-readable format
pub fn format_duration(seconds: f64) -> String {
    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Mask a secret for display, keeping only a short prefix
pub fn mask_secret(secret: &str) -> String {
    let prefix: String = secret.chars().take(3).collect();
    if secret.chars().count() <= 6 {
        "****".to_string()
    } else {
        format!("{}****", prefix)
    }
}
