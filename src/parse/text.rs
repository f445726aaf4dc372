use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

// Non-greedy, so adjacent tags are stripped individually; `.` does not match
// newlines, so a stray `<` at end of line survives.
static TAG_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new("<.*?>").expect("tag pattern compiles"));

/// Removes HTML markup from a string and normalizes UTF-8: strips tags,
/// unescapes entities, composes to NFC, and collapses problematic whitespace
/// and mojibake sequences to single spaces. Idempotent on its own output.
pub fn clean_html(raw: &str) -> String {
    let without_tags = TAG_PATTERN.replace_all(raw, "");
    let decoded = html_escape::decode_html_entities(without_tags.as_ref());
    let composed: String = decoded.nfc().collect();
    composed
        .replace('\n', " ")
        .replace('\u{a0}', " ")
        .replace('\u{ad}', " ")
        .replace("ï¿½", " ")
        .replace('\u{202f}', " ")
        .replace("    ", " ")
        .replace("   ", " ")
        .replace("  ", " ")
        .trim()
        .to_string()
}

/// Title-cases a name field: the first letter of each alphabetic run is
/// uppercased, the rest lowercased.
pub fn title_case(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut prev_alphabetic = false;
    for c in value.chars() {
        if c.is_alphabetic() {
            if prev_alphabetic {
                result.extend(c.to_lowercase());
            } else {
                result.extend(c.to_uppercase());
            }
            prev_alphabetic = true;
        } else {
            result.push(c);
            prev_alphabetic = false;
        }
    }
    result
}
