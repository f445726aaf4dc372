use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

/// Runtime configuration for the fetcher and resolver. Built once at startup
/// and passed in explicitly; nothing in the crate reads the environment after
/// construction.
#[derive(Debug, Clone)]
pub struct Config {
    pub openaire_api: String,
    pub openaire_service: String,
    pub openalex_api: String,
    /// Contact address appended to OpenAlex requests per their polite-pool policy.
    pub mailto: String,
    pub token: Option<String>,
    pub refresh_token: Option<String>,
    pub name_similarity_threshold: f64,
    pub orcid_name_similarity_threshold: f64,
    pub response_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub cache_ttl_minutes: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openaire_api: "https://api.openaire.eu".to_string(),
            openaire_service: "https://services.openaire.eu".to_string(),
            openalex_api: "https://api.openalex.org".to_string(),
            mailto: "research-index@example.org".to_string(),
            token: None,
            refresh_token: None,
            name_similarity_threshold: 0.8,
            orcid_name_similarity_threshold: 0.4,
            response_dir: PathBuf::from("data/json"),
            cache_dir: PathBuf::from(".doi_cache"),
            cache_ttl_minutes: 30,
        }
    }
}

fn env_threshold(key: &str, default: f64) -> Result<f64> {
    match env::var(key) {
        Ok(value) => value
            .parse::<f64>()
            .with_context(|| format!("{key} must be a number, got {value:?}")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = Config::default();
        let config = Config {
            openaire_api: env::var("OPENAIRE_API").unwrap_or(defaults.openaire_api),
            openaire_service: env::var("OPENAIRE_SERVICE").unwrap_or(defaults.openaire_service),
            openalex_api: env::var("OPENALEX_API").unwrap_or(defaults.openalex_api),
            mailto: env::var("OPENALEX_MAILTO").unwrap_or(defaults.mailto),
            token: env::var("TOKEN").ok(),
            refresh_token: env::var("REFRESH_TOKEN").ok(),
            name_similarity_threshold: env_threshold(
                "NAME_SIMILARITY_THRESHOLD",
                defaults.name_similarity_threshold,
            )?,
            orcid_name_similarity_threshold: env_threshold(
                "ORCID_NAME_SIMILARITY_THRESHOLD",
                defaults.orcid_name_similarity_threshold,
            )?,
            response_dir: defaults.response_dir,
            cache_dir: defaults.cache_dir,
            cache_ttl_minutes: defaults.cache_ttl_minutes,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.name_similarity_threshold) {
            bail!("NAME_SIMILARITY_THRESHOLD must be between 0 and 1");
        }
        if !(0.0..=1.0).contains(&self.orcid_name_similarity_threshold) {
            bail!("ORCID_NAME_SIMILARITY_THRESHOLD must be between 0 and 1");
        }
        Ok(())
    }

    pub fn token_endpoint(&self) -> String {
        format!(
            "{}/uoa-user-management/api/users/getAccessToken",
            self.openaire_service
        )
    }

    /// Resolves the OpenAIRE bearer token: a token from the environment wins,
    /// otherwise a refresh token is exchanged at the token endpoint. Failure
    /// here is an unrecoverable setup error; the batch never starts.
    pub async fn resolve_token(&mut self, client: &Client) -> Result<()> {
        if self.token.is_some() {
            return Ok(());
        }
        let Some(refresh_token) = self.refresh_token.clone() else {
            bail!("No refresh token found, could not obtain personal token");
        };

        info!("Found refresh token. Obtaining personal token.");
        let url = format!("{}?refreshToken={}", self.token_endpoint(), refresh_token);
        let response = client
            .get(&url)
            .send()
            .await
            .context("Failed to reach the OpenAIRE token endpoint")?;
        info!("Status code: {}", response.status());
        if !response.status().is_success() {
            bail!("Token endpoint returned HTTP {}", response.status());
        }

        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
        }
        let body: TokenResponse = response
            .json()
            .await
            .context("Token endpoint returned an unexpected body")?;
        self.token = Some(body.access_token);
        Ok(())
    }
}
