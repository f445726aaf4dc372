use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::ArticleRecord;

use super::{ArticleRef, AuthorRef, GraphStore};

#[derive(Default)]
struct MemoryInner {
    authors: Vec<AuthorRef>,
    articles: Vec<ArticleRef>,
    // (author uuid, article uuid) -> rank
    author_of: HashMap<(String, String), i64>,
}

/// In-memory store backend. Holds nodes and relationships in plain maps and
/// enforces the same DOI uniqueness the graph database would; used by tests
/// and dry runs.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn author_count(&self) -> usize {
        self.inner.lock().unwrap().authors.len()
    }

    pub fn article_count(&self) -> usize {
        self.inner.lock().unwrap().articles.len()
    }

    pub fn relationship_count(&self) -> usize {
        self.inner.lock().unwrap().author_of.len()
    }

    pub fn relationship_rank(&self, author_uuid: &str, article_uuid: &str) -> Option<i64> {
        self.inner
            .lock()
            .unwrap()
            .author_of
            .get(&(author_uuid.to_string(), article_uuid.to_string()))
            .copied()
    }

    pub fn authors(&self) -> Vec<AuthorRef> {
        self.inner.lock().unwrap().authors.clone()
    }
}

#[async_trait]
impl GraphStore for MemoryStore {
    async fn query_existing_dois(
        &self,
        dois: &[String],
    ) -> Result<HashMap<String, bool>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(dois
            .iter()
            .map(|doi| {
                let exists = inner.articles.iter().any(|a| &a.doi == doi);
                (doi.clone(), exists)
            })
            .collect())
    }

    async fn find_author_by_orcid(&self, orcid: &str) -> Result<Option<AuthorRef>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .authors
            .iter()
            .find(|a| a.orcid.as_deref() == Some(orcid))
            .cloned())
    }

    async fn find_author_by_initial_lastname(
        &self,
        initial: &str,
        last_name: &str,
    ) -> Result<Option<AuthorRef>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .authors
            .iter()
            .find(|a| {
                a.first_name.chars().next().map(String::from).as_deref() == Some(initial)
                    && a.last_name == last_name
            })
            .cloned())
    }

    async fn create_author(&self, author: &AuthorRef) -> Result<String, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.authors.push(author.clone());
        Ok(author.uuid.clone())
    }

    async fn find_article_by_doi(&self, doi: &str) -> Result<Option<ArticleRef>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.articles.iter().find(|a| a.doi == doi).cloned())
    }

    async fn create_article(
        &self,
        uuid: &str,
        article: &ArticleRecord,
    ) -> Result<String, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.articles.iter().any(|a| a.doi == article.doi) {
            return Err(StoreError::Conflict(format!(
                "article with DOI {} already exists",
                article.doi
            )));
        }
        inner.articles.push(ArticleRef {
            uuid: uuid.to_string(),
            doi: article.doi.clone(),
        });
        Ok(uuid.to_string())
    }

    async fn create_author_of(
        &self,
        author_uuid: &str,
        article_uuid: &str,
        rank: i64,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .author_of
            .entry((author_uuid.to_string(), article_uuid.to_string()))
            .or_insert(rank);
        Ok(())
    }
}
