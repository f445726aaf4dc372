use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

// Registrant/suffix pattern from the Crossref blog post on DOI matching,
// anchored at the end of the string.
static DOI_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)10\.\d{4,9}/[-._;()/:A-Z0-9]+$").expect("DOI pattern compiles"));

/// Per-DOI tracking state, mutated as the DOI moves through the pipeline
/// stages and snapshotted for the final metrics report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DoiStatus {
    pub doi: String,
    pub valid_pattern: bool,
    pub already_exists: bool,
    pub openaire_metadata: bool,
    pub openalex_metadata: bool,
    pub ingestion_success: bool,
}

impl DoiStatus {
    pub fn new(doi: &str) -> Self {
        Self {
            doi: doi.to_string(),
            ..Default::default()
        }
    }
}

/// Normalizes a raw DOI string: trims surrounding whitespace, strips one
/// trailing period and a leading `https://doi.org/` or `doi.org/` prefix.
/// Idempotent.
pub fn normalize_doi(raw: &str) -> String {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_suffix('.').unwrap_or(trimmed);
    let stripped = trimmed
        .strip_prefix("https://doi.org/")
        .or_else(|| trimmed.strip_prefix("doi.org/"))
        .unwrap_or(trimmed);
    stripped.to_string()
}

/// Pattern check for a normalized DOI. The suffix after the registrant must
/// be non-empty, end the string, and contain at least one digit, so bare
/// prefixes like `10.5281/zenodo` are rejected.
pub fn valid_doi_pattern(doi: &str) -> bool {
    let Some(found) = DOI_PATTERN.find(doi) else {
        return false;
    };
    let matched = found.as_str();
    let suffix = match matched.split_once('/') {
        Some((_, suffix)) => suffix,
        None => return false,
    };
    let final_segment = suffix.rsplit('/').next().unwrap_or("");
    !final_segment.is_empty() && suffix.chars().any(|c| c.is_ascii_digit())
}
