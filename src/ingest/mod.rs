use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::FetchError;
use crate::fetch::MetadataFetcher;
use crate::graph::{GraphStore, Neo4jStore};
use crate::parse::parse_metadata;
use crate::resolve::upsert_article;

mod manager;
pub use manager::{DoiAuditLists, DoiManager, IngestionMetrics};

#[derive(Args)]
pub struct IngestArgs {
    /// Path to a text file containing one DOI per line
    pub doi_list: PathBuf,

    /// Maximum number of DOIs to process (default: the whole list)
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Re-fetch metadata for DOIs that already exist in the store
    #[arg(short, long)]
    pub update_metadata: bool,

    /// Delete any existing data and recreate the store constraints first
    #[arg(long)]
    pub initialise: bool,

    /// Bolt URI of the graph store
    #[arg(long, default_value = "bolt://127.0.0.1:7687")]
    pub neo4j_uri: String,

    /// Graph store user
    #[arg(long, default_value = "")]
    pub neo4j_user: String,

    /// Graph store password
    #[arg(long, default_value = "")]
    pub neo4j_password: String,

    /// Directory for raw provider response audit files
    #[arg(long, default_value = "data/json")]
    pub response_dir: PathBuf,

    /// Directory for the HTTP response cache
    #[arg(long, default_value = ".doi_cache")]
    pub cache_dir: PathBuf,

    /// HTTP cache TTL in minutes
    #[arg(long, default_value = "30")]
    pub cache_ttl_minutes: u64,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Path to a text file containing one DOI per line
    pub doi_list: PathBuf,
}

pub fn read_doi_list(path: &PathBuf) -> Result<Vec<String>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut dois = Vec::new();
    for line in BufReader::new(file).lines() {
        dois.push(line?);
    }
    Ok(dois)
}

pub fn run(args: IngestArgs) -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_async(args))
}

pub async fn run_async(args: IngestArgs) -> Result<()> {
    let dois = read_doi_list(&args.doi_list)?;

    let mut config = Config::from_env()?;
    config.response_dir = args.response_dir.clone();
    config.cache_dir = args.cache_dir.clone();
    config.cache_ttl_minutes = args.cache_ttl_minutes;

    let client = Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .context("Failed to build HTTP client")?;
    config.resolve_token(&client).await?;

    let store = Neo4jStore::connect(&args.neo4j_uri, &args.neo4j_user, &args.neo4j_password)
        .await
        .context("Failed to reach the graph store")?;
    if args.initialise {
        info!("Initialising the graph store");
        store.initialise().await?;
    }

    let limit = args.limit.unwrap_or(dois.len());
    let mut manager = DoiManager::new(dois, limit, args.update_metadata)?;

    let fetcher = MetadataFetcher::new(client, &config).context("Failed to set up HTTP cache")?;

    manager.start_ingestion();
    manager.validate_dois(&store).await?;
    ingest_batch(&mut manager, &fetcher, &store, &config).await?;
    manager.end_ingestion();

    let metrics = manager.ingestion_metrics();
    println!("{}", serde_json::to_string_pretty(&metrics)?);
    Ok(())
}

/// Processes every tracked DOI sequentially. Fetch and store failures are
/// logged per DOI and the batch carries on; parse vocabulary errors abort
/// the batch because they signal provider schema drift.
pub async fn ingest_batch(
    manager: &mut DoiManager,
    fetcher: &MetadataFetcher,
    store: &dyn GraphStore,
    config: &Config,
) -> Result<()> {
    let pb = ProgressBar::new(manager.tracked.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    for doi in manager.tracked.clone() {
        pb.inc(1);
        let Some(status) = manager.status(&doi) else {
            continue;
        };
        if !status.valid_pattern {
            continue;
        }
        if status.already_exists && !manager.update_metadata {
            info!("Output {} already exists, skipping", doi);
            continue;
        }

        // Each provider is attempted independently; one failing does not
        // stop the other.
        let openaire = match fetcher.fetch_openaire(&doi).await {
            Ok(results) => {
                manager.mark_openaire_fetched(&doi);
                Some(results)
            }
            Err(e) => {
                log_fetch_failure("OpenAIRE", &doi, &e);
                None
            }
        };
        let openalex = match fetcher.fetch_openalex(&doi).await {
            Ok(work) => {
                manager.mark_openalex_fetched(&doi);
                Some(work)
            }
            Err(e) => {
                log_fetch_failure("OpenAlex", &doi, &e);
                None
            }
        };

        let Some(results) = openaire else {
            continue;
        };
        let records = parse_metadata(&results, &doi, openalex.as_ref())
            .with_context(|| format!("Unexpected provider vocabulary for {doi}"))?;

        let mut all_uploaded = !records.is_empty();
        for record in &records {
            match upsert_article(store, record, config).await {
                Ok(created) => {
                    if created {
                        info!("Upload successful");
                    }
                }
                Err(e) => {
                    error!("Error uploading {} to the graph store: {}", record.doi, e);
                    all_uploaded = false;
                    break;
                }
            }
        }
        if all_uploaded {
            manager.mark_ingested(&doi);
        }
    }

    pb.finish_with_message("Done");
    Ok(())
}

fn log_fetch_failure(provider: &str, doi: &str, error: &FetchError) {
    match error {
        FetchError::NoResults(_) => {
            info!("No {} metadata found for doi {}. {}", provider, doi, error)
        }
        _ => warn!("{} fetch failed for {}: {}", provider, doi, error),
    }
}

/// Offline pattern check for a DOI list; never touches the store.
pub fn run_validate(args: ValidateArgs) -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let dois = read_doi_list(&args.doi_list)?;
    let limit = dois.len();
    let mut manager = DoiManager::new(dois, limit, false)?;
    manager.pattern_check();

    let valid: Vec<&String> = manager
        .tracked
        .iter()
        .filter(|doi| manager.tracker[*doi].valid_pattern)
        .collect();
    let invalid: Vec<&String> = manager
        .tracked
        .iter()
        .filter(|doi| !manager.tracker[*doi].valid_pattern)
        .collect();

    println!("Valid DOIs ({}):", valid.len());
    for doi in valid {
        println!("  {doi}");
    }
    println!("Invalid DOIs ({}):", invalid.len());
    for doi in invalid {
        println!("  {doi}");
    }
    Ok(())
}
