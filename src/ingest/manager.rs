use std::collections::HashMap;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use serde::Serialize;
use tracing::{debug, warn};

use crate::doi::{normalize_doi, valid_doi_pattern, DoiStatus};
use crate::graph::GraphStore;

/// Tracks a DOI batch through pattern check, existence check, fetch and
/// ingestion, and produces the aggregate metrics report. Owns all per-run
/// state; persisted entity state belongs to the store alone.
pub struct DoiManager {
    /// Every submitted DOI, normalized, in input order.
    pub list_of_dois: Vec<String>,
    /// The DOIs actually tracked this run: the first `limit`, deduplicated,
    /// in processing order.
    pub tracked: Vec<String>,
    pub tracker: HashMap<String, DoiStatus>,
    pub update_metadata: bool,
    num_valid_pattern: usize,
    num_invalid_pattern: usize,
    num_existing: usize,
    num_new: usize,
    started_at: Option<Instant>,
    elapsed: Option<Duration>,
}

impl DoiManager {
    pub fn new(raw_dois: Vec<String>, limit: usize, update_metadata: bool) -> Result<Self> {
        if raw_dois.is_empty() {
            bail!("DOI list cannot be empty");
        }
        if limit == 0 {
            bail!("Limit must be positive");
        }

        let list_of_dois: Vec<String> = raw_dois.iter().map(|doi| normalize_doi(doi)).collect();

        let limit = limit.min(list_of_dois.len());
        let mut tracked = Vec::with_capacity(limit);
        let mut tracker = HashMap::with_capacity(limit);
        for doi in &list_of_dois[..limit] {
            if !tracker.contains_key(doi) {
                tracked.push(doi.clone());
                tracker.insert(doi.clone(), DoiStatus::new(doi));
            }
        }

        Ok(Self {
            list_of_dois,
            tracked,
            tracker,
            update_metadata,
            num_valid_pattern: 0,
            num_invalid_pattern: 0,
            num_existing: 0,
            num_new: 0,
            started_at: None,
            elapsed: None,
        })
    }

    pub fn start_ingestion(&mut self) {
        self.started_at = Some(Instant::now());
    }

    pub fn end_ingestion(&mut self) {
        if let Some(started_at) = self.started_at {
            self.elapsed = Some(started_at.elapsed());
        }
    }

    pub fn pattern_check(&mut self) {
        for doi in &self.tracked {
            if valid_doi_pattern(doi) {
                debug!("Valid DOI pattern: {}", doi);
                if let Some(status) = self.tracker.get_mut(doi) {
                    status.valid_pattern = true;
                }
            } else {
                warn!("Invalid DOI pattern: {}", doi);
            }
        }
    }

    /// Batched existence check for every pattern-valid DOI, one store query
    /// for the whole batch. Errors when nothing passed the pattern check.
    pub async fn search_dois(&mut self, store: &dyn GraphStore) -> Result<()> {
        let valid_dois: Vec<String> = self
            .tracked
            .iter()
            .filter(|doi| self.tracker[*doi].valid_pattern)
            .cloned()
            .collect();

        self.num_valid_pattern = valid_dois.len();
        self.num_invalid_pattern = self.tracked.len() - self.num_valid_pattern;

        if valid_dois.is_empty() {
            let msg =
                "No DOIs have passed the pattern check and make sure to run pattern check first.";
            warn!("{}", msg);
            bail!(msg);
        }

        let existing = store
            .query_existing_dois(&valid_dois)
            .await
            .map_err(|e| anyhow::anyhow!("Error whilst searching for DOIs: {e}"))?;

        self.num_existing = 0;
        for doi in &valid_dois {
            if existing.get(doi).copied().unwrap_or(false) {
                if let Some(status) = self.tracker.get_mut(doi) {
                    status.already_exists = true;
                }
                self.num_existing += 1;
            }
        }
        self.num_new = self.num_valid_pattern - self.num_existing;
        Ok(())
    }

    pub async fn validate_dois(&mut self, store: &dyn GraphStore) -> Result<()> {
        self.pattern_check();
        self.search_dois(store).await
    }

    pub fn status(&self, doi: &str) -> Option<&DoiStatus> {
        self.tracker.get(doi)
    }

    pub fn mark_openaire_fetched(&mut self, doi: &str) {
        if let Some(status) = self.tracker.get_mut(doi) {
            status.openaire_metadata = true;
        }
    }

    pub fn mark_openalex_fetched(&mut self, doi: &str) {
        if let Some(status) = self.tracker.get_mut(doi) {
            status.openalex_metadata = true;
        }
    }

    pub fn mark_ingested(&mut self, doi: &str) {
        if let Some(status) = self.tracker.get_mut(doi) {
            status.ingestion_success = true;
        }
    }

    fn statuses(&self) -> impl Iterator<Item = &DoiStatus> {
        self.tracked.iter().map(|doi| &self.tracker[doi])
    }

    pub fn ingestion_metrics(&self) -> IngestionMetrics {
        let collect = |predicate: fn(&DoiStatus) -> bool| -> Vec<String> {
            self.statuses()
                .filter(|s| predicate(s))
                .map(|s| s.doi.clone())
                .collect()
        };

        let ingested = collect(|s| s.ingestion_success);
        let metadata_failed: Vec<String> = if self.update_metadata {
            self.statuses()
                .filter(|s| s.valid_pattern && !s.ingestion_success)
                .map(|s| s.doi.clone())
                .collect()
        } else {
            self.statuses()
                .filter(|s| !s.ingestion_success && !s.already_exists)
                .map(|s| s.doi.clone())
                .collect()
        };

        let lists = DoiAuditLists {
            valid_pattern: collect(|s| s.valid_pattern),
            invalid_pattern: collect(|s| !s.valid_pattern),
            existing: collect(|s| s.already_exists),
            new: collect(|s| s.valid_pattern && !s.already_exists),
            ingested: ingested.clone(),
            metadata_failed: metadata_failed.clone(),
            openaire_success: collect(|s| s.openaire_metadata),
            openalex_success: collect(|s| s.openalex_metadata),
        };

        IngestionMetrics {
            submitted_dois: self.list_of_dois.len(),
            processed_dois: self.tracked.len(),
            new_dois: self.num_new,
            existing_dois: self.num_existing,
            ingested_dois: ingested.len(),
            metadata_failure: metadata_failed.len(),
            valid_pattern_dois: self.num_valid_pattern,
            invalid_pattern_dois: self.num_invalid_pattern,
            openaire_success: lists.openaire_success.len(),
            openalex_success: lists.openalex_success.len(),
            total_time_seconds: self.elapsed.map(|d| d.as_secs_f64()).unwrap_or(0.0),
            doi_lists: lists,
        }
    }
}

/// Aggregate counts for a run, with the DOI lists backing each count so the
/// numbers can be audited programmatically.
#[derive(Debug, Clone, Serialize)]
pub struct IngestionMetrics {
    pub submitted_dois: usize,
    pub processed_dois: usize,
    pub new_dois: usize,
    pub existing_dois: usize,
    pub ingested_dois: usize,
    pub metadata_failure: usize,
    pub valid_pattern_dois: usize,
    pub invalid_pattern_dois: usize,
    pub openaire_success: usize,
    pub openalex_success: usize,
    pub total_time_seconds: f64,
    pub doi_lists: DoiAuditLists,
}

#[derive(Debug, Clone, Serialize)]
pub struct DoiAuditLists {
    pub valid_pattern: Vec<String>,
    pub invalid_pattern: Vec<String>,
    pub existing: Vec<String>,
    pub new: Vec<String>,
    pub ingested: Vec<String>,
    pub metadata_failed: Vec<String>,
    pub openaire_success: Vec<String>,
    pub openalex_success: Vec<String>,
}
