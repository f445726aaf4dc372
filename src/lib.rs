use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub mod config;
pub mod doi;
pub mod error;
pub mod fetch;
pub mod graph;
pub mod ingest;
pub mod parse;
pub mod resolve;

/// An author reference as parsed from provider metadata, before it has been
/// resolved against the graph. Rank is the 1-based position in the article's
/// citation author list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorRecord {
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orcid: Option<String>,
    pub rank: i64,
}

/// A normalized research output parsed from provider metadata, keyed by DOI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub doi: String,
    pub title: String,
    pub abstract_text: String,
    pub authors: Vec<AuthorRecord>,
    pub journal: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,
    pub publication_year: Option<i64>,
    pub publication_month: Option<i64>,
    pub publication_day: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    pub result_type: String,
    pub resource_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openalex: Option<String>,
    pub cited_by_count: i64,
    pub cited_by_count_date: NaiveDate,
}
