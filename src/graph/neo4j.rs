use std::collections::HashMap;

use async_trait::async_trait;
use neo4rs::{query, BoltType, Graph};
use tracing::info;

use crate::error::StoreError;
use crate::ArticleRecord;

use super::{ArticleRef, AuthorRef, GraphStore};

/// Property-graph backend over the Bolt protocol. Uniqueness of
/// `Article.doi` and `Author.orcid` is enforced by store constraints, not
/// replicated here.
pub struct Neo4jStore {
    graph: Graph,
}

impl Neo4jStore {
    /// Opens a connection pool and verifies connectivity with a trivial
    /// round trip before first use.
    pub async fn connect(uri: &str, user: &str, password: &str) -> Result<Self, StoreError> {
        let graph = Graph::new(uri, user, password)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        graph
            .run(query("RETURN 1"))
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        info!("Connected to graph store at {}", uri);
        Ok(Self { graph })
    }

    /// Deletes all existing data and recreates the DOI uniqueness constraint.
    /// Author ORCID uniqueness stays best-effort: the resolver can reject an
    /// ORCID match on an implausible name and legitimately create a second
    /// node carrying the same ORCID.
    pub async fn initialise(&self) -> Result<(), StoreError> {
        self.graph.run(query("MATCH (n) DETACH DELETE n")).await?;
        self.graph
            .run(query(
                "CREATE CONSTRAINT article_doi IF NOT EXISTS \
                 FOR (a:Article) REQUIRE a.doi IS UNIQUE",
            ))
            .await?;
        Ok(())
    }
}

fn author_from_row(row: &neo4rs::Row) -> Result<AuthorRef, StoreError> {
    Ok(AuthorRef {
        uuid: row.get::<String>("uuid")?,
        first_name: row.get::<Option<String>>("first_name")?.unwrap_or_default(),
        last_name: row.get::<Option<String>>("last_name")?.unwrap_or_default(),
        orcid: row.get::<Option<String>>("orcid")?,
    })
}

#[async_trait]
impl GraphStore for Neo4jStore {
    async fn query_existing_dois(
        &self,
        dois: &[String],
    ) -> Result<HashMap<String, bool>, StoreError> {
        let mut result = self
            .graph
            .execute(
                query(
                    "UNWIND $dois AS doi \
                     OPTIONAL MATCH (a:Article {doi: doi}) \
                     RETURN doi, COUNT(a) > 0 AS present",
                )
                .param("dois", dois.to_vec()),
            )
            .await?;

        let mut existing = HashMap::new();
        while let Some(row) = result.next().await? {
            existing.insert(row.get::<String>("doi")?, row.get::<bool>("present")?);
        }
        Ok(existing)
    }

    async fn find_author_by_orcid(&self, orcid: &str) -> Result<Option<AuthorRef>, StoreError> {
        let mut result = self
            .graph
            .execute(
                query(
                    "MATCH (a:Author {orcid: $orcid}) \
                     RETURN a.uuid AS uuid, a.first_name AS first_name, \
                            a.last_name AS last_name, a.orcid AS orcid \
                     LIMIT 1",
                )
                .param("orcid", orcid),
            )
            .await?;

        match result.next().await? {
            Some(row) => Ok(Some(author_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn find_author_by_initial_lastname(
        &self,
        initial: &str,
        last_name: &str,
    ) -> Result<Option<AuthorRef>, StoreError> {
        let mut result = self
            .graph
            .execute(
                query(
                    "MATCH (a:Author) \
                     WHERE left(a.first_name, 1) = $initial AND a.last_name = $last_name \
                     RETURN a.uuid AS uuid, a.first_name AS first_name, \
                            a.last_name AS last_name, a.orcid AS orcid \
                     LIMIT 1",
                )
                .param("initial", initial)
                .param("last_name", last_name),
            )
            .await?;

        match result.next().await? {
            Some(row) => Ok(Some(author_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn create_author(&self, author: &AuthorRef) -> Result<String, StoreError> {
        let mut fields: Vec<(&str, BoltType)> = vec![
            ("uuid", author.uuid.as_str().into()),
            ("first_name", author.first_name.as_str().into()),
            ("last_name", author.last_name.as_str().into()),
        ];
        if let Some(orcid) = &author.orcid {
            fields.push(("orcid", orcid.as_str().into()));
        }
        run_create(&self.graph, "Author", fields).await?;
        Ok(author.uuid.clone())
    }

    async fn find_article_by_doi(&self, doi: &str) -> Result<Option<ArticleRef>, StoreError> {
        let mut result = self
            .graph
            .execute(
                query(
                    "MATCH (a:Article {doi: $doi}) \
                     RETURN a.uuid AS uuid, a.doi AS doi \
                     LIMIT 1",
                )
                .param("doi", doi),
            )
            .await?;

        match result.next().await? {
            Some(row) => Ok(Some(ArticleRef {
                uuid: row.get::<String>("uuid")?,
                doi: row.get::<String>("doi")?,
            })),
            None => Ok(None),
        }
    }

    async fn create_article(
        &self,
        uuid: &str,
        article: &ArticleRecord,
    ) -> Result<String, StoreError> {
        let mut fields: Vec<(&str, BoltType)> = vec![
            ("uuid", uuid.into()),
            ("doi", article.doi.as_str().into()),
            ("title", article.title.as_str().into()),
            ("abstract", article.abstract_text.as_str().into()),
            ("journal", article.journal.as_str().into()),
            ("result_type", article.result_type.as_str().into()),
            ("resource_type", article.resource_type.as_str().into()),
            ("cited_by_count", article.cited_by_count.into()),
            (
                "cited_by_count_date",
                article.cited_by_count_date.to_string().into(),
            ),
        ];
        if let Some(issue) = &article.issue {
            fields.push(("issue", issue.as_str().into()));
        }
        if let Some(volume) = &article.volume {
            fields.push(("volume", volume.as_str().into()));
        }
        if let Some(year) = article.publication_year {
            fields.push(("publication_year", year.into()));
        }
        if let Some(month) = article.publication_month {
            fields.push(("publication_month", month.into()));
        }
        if let Some(day) = article.publication_day {
            fields.push(("publication_day", day.into()));
        }
        if let Some(publisher) = &article.publisher {
            fields.push(("publisher", publisher.as_str().into()));
        }
        if let Some(openalex) = &article.openalex {
            fields.push(("openalex", openalex.as_str().into()));
        }
        run_create(&self.graph, "Article", fields).await?;
        Ok(uuid.to_string())
    }

    async fn create_author_of(
        &self,
        author_uuid: &str,
        article_uuid: &str,
        rank: i64,
    ) -> Result<(), StoreError> {
        self.graph
            .run(
                query(
                    "MATCH (a:Author {uuid: $author_uuid}) \
                     MATCH (o:Article {uuid: $article_uuid}) \
                     MERGE (a)-[r:author_of]->(o) \
                     ON CREATE SET r.rank = $rank",
                )
                .param("author_uuid", author_uuid)
                .param("article_uuid", article_uuid)
                .param("rank", rank),
            )
            .await?;
        Ok(())
    }
}

/// Creates a node with exactly the given properties. Property names are
/// code-controlled; values travel as query parameters.
async fn run_create(
    graph: &Graph,
    label: &str,
    fields: Vec<(&str, BoltType)>,
) -> Result<(), StoreError> {
    let props = fields
        .iter()
        .map(|(key, _)| format!("{key}: ${key}"))
        .collect::<Vec<_>>()
        .join(", ");
    let mut q = query(&format!("CREATE (n:{label} {{{props}}})"));
    for (key, value) in fields {
        q = q.param(key, value);
    }
    graph.run(q).await?;
    Ok(())
}
