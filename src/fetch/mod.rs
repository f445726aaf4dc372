use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};
use urlencoding::encode;

use crate::config::Config;
use crate::error::FetchError;

mod cache;
pub use cache::ResponseCache;

/// Strips slashes so a DOI can name a file under the audit directory.
pub fn filesystem_safe_doi(doi: &str) -> String {
    doi.replace('/', "")
}

/// Fetches raw provider metadata for a DOI, serving repeat requests from an
/// on-disk TTL cache and persisting every successful body for audit/replay.
pub struct MetadataFetcher {
    client: Client,
    cache: ResponseCache,
    openaire_api: String,
    openalex_api: String,
    mailto: String,
    token: Option<String>,
    response_dir: PathBuf,
}

impl MetadataFetcher {
    pub fn new(client: Client, config: &Config) -> io::Result<Self> {
        let cache = ResponseCache::new(
            &config.cache_dir,
            Duration::from_secs(config.cache_ttl_minutes * 60),
        )?;
        Ok(Self {
            client,
            cache,
            openaire_api: config.openaire_api.clone(),
            openalex_api: config.openalex_api.clone(),
            mailto: config.mailto.clone(),
            token: config.token.clone(),
            response_dir: config.response_dir.clone(),
        })
    }

    /// Requests research-product metadata from the OpenAIRE Graph API and
    /// returns the raw result entries, uninterpreted.
    pub async fn fetch_openaire(&self, doi: &str) -> Result<Vec<Value>, FetchError> {
        let url = format!(
            "{}/search/researchProducts?format=json&doi={}",
            self.openaire_api,
            encode(doi)
        );
        let body = self.get_body(&url, self.token.as_deref()).await?;
        let json: Value = serde_json::from_str(&body).map_err(|e| {
            FetchError::Provider(format!("OpenAIRE returned malformed JSON: {e}"))
        })?;

        if let Some(error) = json.get("error").filter(|e| !e.is_null()) {
            let message = error
                .as_str()
                .map(String::from)
                .unwrap_or_else(|| error.to_string());
            return Err(FetchError::Provider(message));
        }

        self.persist_raw("openaire", doi, &body)?;

        let results = openaire_results(&json);
        if results.is_empty() {
            return Err(FetchError::NoResults(doi.to_string()));
        }
        Ok(results)
    }

    /// Requests work metadata from OpenAlex. No auth; the contact address is
    /// passed for their polite pool.
    pub async fn fetch_openalex(&self, doi: &str) -> Result<Value, FetchError> {
        let url = format!(
            "{}/works/doi:{}?mailto={}",
            self.openalex_api,
            encode(doi),
            self.mailto
        );
        let body = self.get_body(&url, None).await?;
        let json: Value = serde_json::from_str(&body)
            .map_err(|e| FetchError::Provider(format!("OpenAlex returned malformed JSON: {e}")))?;

        if json.is_null() || json.as_object().map_or(false, |o| o.is_empty()) {
            return Err(FetchError::NoResults(doi.to_string()));
        }

        self.persist_raw("openalex", doi, &body)?;
        Ok(json)
    }

    async fn get_body(&self, url: &str, bearer: Option<&str>) -> Result<String, FetchError> {
        if let Some(cached) = self.cache.get(url) {
            debug!("Cache hit for {}", url);
            return Ok(cached);
        }

        let mut request = self.client.get(url);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        let status = response.status();
        debug!("Response code: {}", status);

        if !status.is_success() {
            return Err(classify_status(status));
        }

        let body = response.text().await?;
        if let Err(e) = self.cache.put(url, &body) {
            warn!("Failed to cache response for {}: {}", url, e);
        }
        Ok(body)
    }

    fn persist_raw(&self, provider: &str, doi: &str, body: &str) -> Result<(), FetchError> {
        let dir = self.response_dir.join(provider);
        fs::create_dir_all(&dir)?;
        let path = dir.join(format!("{}.json", filesystem_safe_doi(doi)));
        fs::write(path, body)?;
        Ok(())
    }
}

fn classify_status(status: StatusCode) -> FetchError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => FetchError::Auth,
        StatusCode::NOT_FOUND => FetchError::NotFound(status.as_u16()),
        s if s.is_client_error() => FetchError::Client(status.as_u16()),
        _ => FetchError::Unavailable(status.as_u16()),
    }
}

/// The OpenAIRE envelope nests results either as an array or under a
/// `result` key depending on the response variant.
fn openaire_results(body: &Value) -> Vec<Value> {
    match body.pointer("/response/results") {
        Some(Value::Array(entries)) => entries.clone(),
        Some(Value::Object(wrapper)) => match wrapper.get("result") {
            Some(Value::Array(entries)) => entries.clone(),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}
