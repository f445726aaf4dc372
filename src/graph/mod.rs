use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::ArticleRecord;

mod memory;
mod neo4j;
pub use memory::MemoryStore;
pub use neo4j::Neo4jStore;

/// An Author node as read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorRef {
    pub uuid: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orcid: Option<String>,
}

/// An Article node as read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleRef {
    pub uuid: String,
    pub doi: String,
}

/// The narrow interface the pipeline needs from the property graph. The
/// store exclusively owns persisted entity state and enforces uniqueness;
/// backends are swappable behind this trait.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Batched existence check: one entry per input DOI, true when an
    /// Article with that DOI is already present.
    async fn query_existing_dois(
        &self,
        dois: &[String],
    ) -> Result<HashMap<String, bool>, StoreError>;

    async fn find_author_by_orcid(&self, orcid: &str) -> Result<Option<AuthorRef>, StoreError>;

    /// Coarse candidate filter on first initial + last name. Nicknames and
    /// initialisms can produce false negatives; that is accepted.
    async fn find_author_by_initial_lastname(
        &self,
        initial: &str,
        last_name: &str,
    ) -> Result<Option<AuthorRef>, StoreError>;

    /// Creates an Author node, returning its uuid.
    async fn create_author(&self, author: &AuthorRef) -> Result<String, StoreError>;

    async fn find_article_by_doi(&self, doi: &str) -> Result<Option<ArticleRef>, StoreError>;

    /// Creates an Article node with the given uuid and all record fields,
    /// returning the uuid. A duplicate DOI surfaces as [`StoreError::Conflict`].
    async fn create_article(
        &self,
        uuid: &str,
        article: &ArticleRecord,
    ) -> Result<String, StoreError>;

    /// Creates the `author_of` relationship with its rank. Merge semantics:
    /// repeating the call for the same pair must not duplicate the edge.
    async fn create_author_of(
        &self,
        author_uuid: &str,
        article_uuid: &str,
        rank: i64,
    ) -> Result<(), StoreError>;
}
