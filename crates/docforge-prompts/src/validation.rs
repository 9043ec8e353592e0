//! Structural checks applied to prompt files before they are used.

use once_cell::sync::Lazy;
use regex::Regex;

/// Minimum trimmed prompt length, in characters.
pub const MIN_PROMPT_CHARS: usize = 100;

/// Minimum number of Markdown header lines.
pub const MIN_HEADERS: usize = 1;

static HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#+ .*$").expect("static regex"));

static FENCED_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```.*?```").expect("static regex"));

static FORBIDDEN: Lazy<[(&'static str, Regex); 2]> = Lazy::new(|| {
    [
        (
            "script",
            Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").expect("static regex"),
        ),
        (
            "iframe",
            Regex::new(r"(?is)<iframe\b[^>]*>.*?</iframe\s*>").expect("static regex"),
        ),
    ]
});

/// Count Markdown header lines (`#`, `##`, ... followed by a space).
#[must_use]
pub fn header_count(content: &str) -> usize {
    HEADER.find_iter(content).count()
}

/// Check `content` and return every problem found.
///
/// # Errors
///
/// Returns the list of issues when the prompt is too short, has no header,
/// or embeds `<script>`/`<iframe>` elements outside fenced code blocks.
pub fn validate_prompt(content: &str) -> Result<(), Vec<String>> {
    let trimmed = content.trim();
    let mut issues = Vec::new();

    let length = trimmed.chars().count();
    if length < MIN_PROMPT_CHARS {
        issues.push(format!(
            "prompt is too short ({length} < {MIN_PROMPT_CHARS} characters)"
        ));
    }

    let headers = header_count(trimmed);
    if headers < MIN_HEADERS {
        issues.push(format!("prompt has {headers} headers, need at least {MIN_HEADERS}"));
    }

    let outside_code = FENCED_CODE.replace_all(trimmed, "");
    for (name, pattern) in FORBIDDEN.iter() {
        if pattern.is_match(&outside_code) {
            issues.push(format!("prompt contains a <{name}> element outside a code block"));
        }
    }

    if issues.is_empty() { Ok(()) } else { Err(issues) }
}
