//! Logging utilities with credential protection
//!
//! Vendor keys travel in request headers and sometimes come back echoed in
//! error bodies. Anything that may contain one goes through these helpers
//! before it reaches a log line.

use regex::Regex;
use std::sync::OnceLock;

/// Obscures a credential string by showing only the first few characters
///
/// # Examples
///
/// ```rust
/// use switchboard::utils::logging::obscure_credential;
///
/// let credential = "sk-proj-abcdef123456";
/// assert_eq!(obscure_credential(credential), "sk-pr***");
/// ```
pub fn obscure_credential(credential: &str) -> String {
    let char_count = credential.chars().count();
    if char_count <= 5 {
        "*".repeat(char_count)
    } else {
        format!("{}***", truncate_string(credential, 5))
    }
}

/// Safely truncates a string to a maximum number of characters, respecting UTF-8 boundaries
///
/// # Examples
///
/// ```rust
/// use switchboard::utils::logging::truncate_string;
///
/// assert_eq!(truncate_string("Hello World", 5), "Hello");
/// assert_eq!(truncate_string("Short", 100), "Short");
/// ```
pub fn truncate_string(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

/// Shorten text for a log line, marking the cut
pub fn preview(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        format!("{}...", truncate_string(s, max_chars))
    } else {
        s.to_string()
    }
}

fn credential_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // OpenAI/DeepSeek (sk-), xAI (xai-), Google (AIza), Replicate (r8_)
        Regex::new(r"\b(?:sk-[A-Za-z0-9_\-]{8,}|xai-[A-Za-z0-9_\-]{8,}|AIza[A-Za-z0-9_\-]{20,}|r8_[A-Za-z0-9]{8,})")
            .expect("credential pattern is valid")
    })
}

fn assignment_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)((?:api[_-]?key|token|key)=)([^&\s]+)")
            .expect("assignment pattern is valid")
    })
}

/// Detects substrings that look like vendor credentials and obscures them
pub fn sanitize_for_logging(input: &str) -> String {
    let masked = credential_pattern().replace_all(input, |caps: &regex::Captures<'_>| {
        obscure_credential(&caps[0])
    });
    assignment_pattern()
        .replace_all(&masked, |caps: &regex::Captures<'_>| {
            format!("{}{}", &caps[1], obscure_credential(&caps[2]))
        })
        .into_owned()
}
