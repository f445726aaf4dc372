use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::ParseError;
use crate::{ArticleRecord, AuthorRecord};

mod text;
pub use text::{clean_html, title_case};

const RESULT_TYPES: [&str; 4] = ["publication", "dataset", "software", "other"];
const PUBLICATION_RESOURCE_TYPES: [&str; 2] = ["Article", "Pre-print"];
const DATASET_RESOURCE_TYPES: [&str; 1] = ["Dataset"];

/// Formats an ORCID as its canonical URI. Already-canonical values pass
/// through unchanged.
pub fn canonical_orcid(value: &str) -> String {
    if value.starts_with("https://orcid.org/") {
        value.to_string()
    } else {
        format!("https://orcid.org/{value}")
    }
}

fn extract_orcid(metadata: &Value) -> Option<String> {
    let id = metadata.pointer("/pid/id")?;
    let scheme = id.get("scheme").and_then(Value::as_str)?;
    if scheme == "orcid" || scheme == "orcid_pending" {
        id.get("value").and_then(Value::as_str).map(String::from)
    } else {
        None
    }
}

// Provider full names are proper names; an all-lowercase string here is
// noise, not an author.
fn looks_like_personal_name(full_name: &str) -> bool {
    full_name
        .split_whitespace()
        .any(|token| token.chars().next().is_some_and(char::is_uppercase))
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// Parses one provider author entry into an [`AuthorRecord`].
///
/// Returns `None` when no first/last name pair can be determined; callers
/// skip such entries without erroring.
pub fn parse_author(metadata: &Value) -> Option<AuthorRecord> {
    let orcid = extract_orcid(metadata);

    let mut first_name = title_case(metadata.get("name").and_then(Value::as_str).unwrap_or(""));
    let mut last_name = title_case(metadata.get("surname").and_then(Value::as_str).unwrap_or(""));

    // Provider artifact: one name field sometimes repeats the other.
    if !first_name.is_empty() && last_name.contains(&first_name) {
        last_name = last_name.replace(&first_name, "").trim().to_string();
    }
    if !last_name.is_empty() && first_name.contains(&last_name) {
        first_name = first_name.replace(&last_name, "").trim().to_string();
    }

    if first_name.is_empty() && last_name.is_empty() {
        if let Some(full_name) = metadata.get("fullName").and_then(Value::as_str) {
            if looks_like_personal_name(full_name) {
                let tokens: Vec<&str> = full_name.split_whitespace().collect();
                if tokens.len() == 2 {
                    first_name = tokens[0].to_string();
                    last_name = tokens[1].to_string();
                } else if tokens.len() > 2 {
                    first_name = tokens[0].to_string();
                    last_name = tokens[1..].join(" ");
                }
            }
        }
    }

    if !last_name.is_empty() && first_name.is_empty() {
        let cleaned = clean_html(&last_name);
        let mut names: Vec<&str> = cleaned.split('\u{202f}').collect();
        if names.len() == 1 {
            names = cleaned.split(' ').collect();
        }
        if names.len() == 2 {
            first_name = names[0].to_string();
            last_name = names[1].to_string();
        } else if names.len() > 2 {
            first_name = names[0].to_string();
            last_name = names[1..].join(" ");
        } else {
            debug!("Split name produced {:?}", names);
            first_name.clear();
            last_name.clear();
        }
    }

    let rank = match metadata.get("rank") {
        Some(Value::Number(n)) => n.as_i64().unwrap_or(1),
        Some(Value::String(s)) => s.parse().unwrap_or(1),
        _ => 1,
    };

    if first_name.is_empty() || last_name.is_empty() {
        return None;
    }
    Some(AuthorRecord {
        first_name,
        last_name,
        orcid: orcid.map(|id| canonical_orcid(&id)),
        rank,
    })
}

fn parse_date(date: &str) -> (Option<i64>, Option<i64>, Option<i64>) {
    let parts: Vec<&str> = date.split('-').collect();
    let year = parts.first().and_then(|p| p.parse().ok());
    let month = parts.get(1).and_then(|p| p.parse().ok());
    let day = parts.last().and_then(|p| p.parse().ok());
    (year, month, day)
}

/// Parses OpenAIRE result entries into normalized article records, folding
/// in the OpenAlex work metadata for identifiers and citation counts.
///
/// Unknown result/resource vocabulary is a hard error: it signals provider
/// schema drift and must not be swallowed.
pub fn parse_metadata(
    results: &[Value],
    valid_doi: &str,
    openalex_metadata: Option<&Value>,
) -> Result<Vec<ArticleRecord>, ParseError> {
    info!("There are {} results", results.len());

    let mut articles = Vec::with_capacity(results.len());

    for result in results {
        let title = result
            .get("mainTitle")
            .and_then(Value::as_str)
            .map(clean_html)
            .unwrap_or_default();
        info!("Parsing output {}", title);

        let result_type = result
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        if !RESULT_TYPES.contains(&result_type.as_str()) {
            return Err(ParseError::UnknownResultType(result_type));
        }

        let publisher = string_field(result, "publisher");

        let mut journal = String::new();
        let mut issue = None;
        let mut volume = None;
        if result_type == "publication" {
            if let Some(container) = result.get("container").filter(|c| !c.is_null()) {
                journal = container
                    .get("name")
                    .and_then(Value::as_str)
                    .map(clean_html)
                    .unwrap_or_default();
                issue = string_field(container, "iss");
                volume = string_field(container, "vol");
            }
        }

        let abstract_text = match result.get("description") {
            Some(Value::Array(entries)) => entries
                .first()
                .and_then(Value::as_str)
                .map(clean_html)
                .unwrap_or_default(),
            Some(Value::String(text)) => clean_html(text),
            _ => String::new(),
        };

        let mut authors = Vec::new();
        match result.get("author") {
            Some(Value::Array(entries)) => {
                for entry in entries {
                    if let Some(author) = parse_author(entry) {
                        authors.push(author);
                    }
                }
            }
            Some(entry) if !entry.is_null() => {
                if let Some(author) = parse_author(entry) {
                    authors.push(author);
                }
            }
            _ => {}
        }

        let mut resource_type = String::new();
        let mut instance_date: Option<String> = None;
        if let Some(Value::Array(instances)) = result.get("instance") {
            for instance in instances {
                resource_type = instance
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                instance_date = instance
                    .get("publicationDate")
                    .and_then(Value::as_str)
                    .map(String::from);
                if result_type == "publication" {
                    if !PUBLICATION_RESOURCE_TYPES.contains(&resource_type.as_str()) {
                        return Err(ParseError::UnknownResourceType {
                            result_type,
                            resource_type,
                        });
                    }
                    break;
                } else if result_type == "dataset" {
                    if !DATASET_RESOURCE_TYPES.contains(&resource_type.as_str()) {
                        return Err(ParseError::UnknownResourceType {
                            result_type,
                            resource_type,
                        });
                    }
                    break;
                }
            }
        }
        info!("Resource {} is a {}", valid_doi, result_type);

        let date = instance_date.or_else(|| {
            result
                .get("publicationDate")
                .and_then(Value::as_str)
                .map(String::from)
        });
        let (publication_year, publication_month, publication_day) = match date {
            Some(ref d) => parse_date(d),
            None => (None, None, None),
        };

        let openalex_id = openalex_metadata
            .and_then(|work| work.get("id"))
            .and_then(Value::as_str)
            .map(String::from);
        let cited_by_count = openalex_metadata
            .and_then(|work| work.get("cited_by_count"))
            .and_then(Value::as_i64)
            .or_else(|| {
                result
                    .pointer("/indicators/citationImpact/citationCount")
                    .and_then(Value::as_i64)
            })
            .unwrap_or(0);

        articles.push(ArticleRecord {
            doi: valid_doi.to_string(),
            title,
            abstract_text,
            authors,
            journal,
            issue,
            volume,
            publication_year,
            publication_month,
            publication_day,
            publisher,
            result_type,
            resource_type,
            openalex: openalex_id,
            cited_by_count,
            cited_by_count_date: Utc::now().date_naive(),
        });
    }

    Ok(articles)
}
