// file: src/extractor/patterns.rs
// description: compiled regex patterns for extraction output cleanup and cypher identifiers
// reference: https://docs.rs/regex

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Model replies occasionally wrap JSON in a markdown fence
    pub static ref JSON_CODE_FENCE: Regex = Regex::new(
        r"(?s)^\s*```(?:json|JSON)?\s*\n?(.*?)\n?\s*```\s*$"
    ).expect("JSON_CODE_FENCE regex is valid");

    // Cypher relationship types
    pub static ref NON_IDENTIFIER: Regex = Regex::new(
        r"[^A-Z0-9_]+"
    ).expect("NON_IDENTIFIER regex is valid");

    pub static ref LEADING_NON_LETTER: Regex = Regex::new(
        r"^[^A-Z]"
    ).expect("LEADING_NON_LETTER regex is valid");
}

/// Returns the body of a fenced JSON block, or the input unchanged.
pub fn strip_code_fence(text: &str) -> &str {
    match JSON_CODE_FENCE.captures(text).and_then(|c| c.get(1)) {
        Some(body) => body.as_str().trim(),
        None => text.trim(),
    }
}
