use difflib::sequencematcher::SequenceMatcher;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::StoreError;
use crate::graph::{AuthorRef, GraphStore};
use crate::parse::canonical_orcid;
use crate::{ArticleRecord, AuthorRecord};

fn reverse_tokens(name: &str) -> String {
    name.split(' ').rev().collect::<Vec<_>>().join(" ")
}

/// Scores the similarity of two personal names in `[0, 1]`.
///
/// Both inputs are trimmed and lowercased, then compared with the gestalt
/// matching-blocks ratio. A ratio above the threshold wins outright;
/// otherwise the comparison is retried with the first name's token order
/// reversed (catching "Last First" vs "First Last"), and failing that the
/// mean of both ratios is returned. Reversal is applied to one side only;
/// that asymmetry is intended.
pub fn score_name_similarity(name_a: &str, name_b: &str, threshold: f64) -> f64 {
    debug!("Comparing {} with {}", name_a, name_b);
    let a = name_a.trim().to_lowercase();
    let b = name_b.trim().to_lowercase();

    let ratio_a = SequenceMatcher::new(a.as_str(), b.as_str()).ratio() as f64;
    if ratio_a > threshold {
        return ratio_a;
    }

    let reversed = reverse_tokens(&a);
    let ratio_b = SequenceMatcher::new(reversed.as_str(), b.as_str()).ratio() as f64;
    if ratio_b > threshold {
        ratio_b
    } else {
        (ratio_a + ratio_b) / 2.0
    }
}

fn full_name(first_name: &str, last_name: &str) -> String {
    format!("{first_name} {last_name}")
}

/// Resolves an incoming author against the store, creating a node when no
/// match is found. Returns the resolved-or-created uuid.
///
/// An ORCID match is preferred but sanity-checked: when the stored name
/// scores below the (deliberately loose) ORCID threshold, the match is
/// rejected with a warning and resolution falls back to the first-initial +
/// last-name candidate lookup.
pub async fn resolve_author(
    store: &dyn GraphStore,
    author: &AuthorRecord,
    config: &Config,
) -> Result<String, StoreError> {
    let mut resolved: Option<AuthorRef> = None;

    if let Some(orcid) = &author.orcid {
        if let Some(existing) = store.find_author_by_orcid(orcid).await? {
            let name_store = full_name(&existing.first_name, &existing.last_name);
            let name_author = full_name(&author.first_name, &author.last_name);
            let score = score_name_similarity(
                &name_store,
                &name_author,
                config.name_similarity_threshold,
            );
            if score < config.orcid_name_similarity_threshold {
                warn!(
                    "Result from ORCID {} does not match author name: {}. Ratio: {}",
                    orcid, name_author, score
                );
            } else {
                resolved = Some(existing);
            }
        }
    }

    if resolved.is_none() {
        let initial: String = author
            .first_name
            .chars()
            .next()
            .map(String::from)
            .unwrap_or_default();
        resolved = store
            .find_author_by_initial_lastname(&initial, &author.last_name)
            .await?;
    }

    if let Some(existing) = resolved {
        info!("Author {} {} exists", author.first_name, author.last_name);
        return Ok(existing.uuid);
    }

    let node = AuthorRef {
        uuid: Uuid::new_v4().to_string(),
        first_name: author.first_name.clone(),
        last_name: author.last_name.clone(),
        orcid: author.orcid.as_deref().map(canonical_orcid),
    };
    let uuid = store.create_author(&node).await?;
    info!(
        "Author {} {} does not exist. Created new node.",
        author.first_name, author.last_name
    );
    Ok(uuid)
}

/// Creates the article and its authorship edges unless the DOI is already
/// present. Returns whether a new Article node was created.
///
/// Create-only: re-ingesting an existing DOI never updates fields. A
/// uniqueness conflict during creation means another writer got there first
/// and is treated as "already exists".
pub async fn upsert_article(
    store: &dyn GraphStore,
    article: &ArticleRecord,
    config: &Config,
) -> Result<bool, StoreError> {
    if store.find_article_by_doi(&article.doi).await?.is_some() {
        info!("Output {} exists. Loaded from graph", article.doi);
        return Ok(false);
    }

    let uuid = Uuid::new_v4().to_string();
    let article_uuid = match store.create_article(&uuid, article).await {
        Ok(created) => created,
        Err(StoreError::Conflict(message)) => {
            warn!("Article {} already exists: {}", article.doi, message);
            return Ok(false);
        }
        Err(other) => return Err(other),
    };
    info!("Output {} did not exist. Created new node", article.doi);

    for author in &article.authors {
        let author_uuid = resolve_author(store, author, config).await?;
        store
            .create_author_of(&author_uuid, &article_uuid, author.rank)
            .await?;
    }
    Ok(true)
}
