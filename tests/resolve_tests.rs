use chrono::Utc;
use doi_graph::config::Config;
use doi_graph::error::StoreError;
use doi_graph::graph::{AuthorRef, GraphStore, MemoryStore};
use doi_graph::resolve::{resolve_author, upsert_article};
use doi_graph::{ArticleRecord, AuthorRecord};

fn author(first: &str, last: &str, orcid: Option<&str>, rank: i64) -> AuthorRecord {
    AuthorRecord {
        first_name: first.to_string(),
        last_name: last.to_string(),
        orcid: orcid.map(|o| format!("https://orcid.org/{o}")),
        rank,
    }
}

fn article(doi: &str, authors: Vec<AuthorRecord>) -> ArticleRecord {
    ArticleRecord {
        doi: doi.to_string(),
        title: "Modelling pathways".to_string(),
        abstract_text: "An abstract".to_string(),
        authors,
        journal: "PLOS Climate".to_string(),
        issue: None,
        volume: None,
        publication_year: Some(2024),
        publication_month: Some(9),
        publication_day: Some(5),
        publisher: Some("PLOS".to_string()),
        result_type: "publication".to_string(),
        resource_type: "Article".to_string(),
        openalex: None,
        cited_by_count: 0,
        cited_by_count_date: Utc::now().date_naive(),
    }
}

#[tokio::test]
async fn test_resolve_creates_new_author() {
    let store = MemoryStore::new();
    let config = Config::default();

    let uuid = resolve_author(&store, &author("Will", "Usher", None, 1), &config)
        .await
        .unwrap();

    assert_eq!(store.author_count(), 1);
    let created = &store.authors()[0];
    assert_eq!(created.uuid, uuid);
    assert_eq!(created.first_name, "Will");
    assert_eq!(created.last_name, "Usher");
    assert_eq!(created.orcid, None);
}

#[tokio::test]
async fn test_resolve_matches_existing_by_orcid() {
    let store = MemoryStore::new();
    let config = Config::default();

    let incoming = author("Will", "Usher", Some("0000-0001-9367-1791"), 1);
    let first = resolve_author(&store, &incoming, &config).await.unwrap();
    let second = resolve_author(&store, &incoming, &config).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(store.author_count(), 1);
}

#[tokio::test]
async fn test_resolve_rejects_orcid_match_with_implausible_name() {
    let store = MemoryStore::new();
    let config = Config::default();

    store
        .create_author(&AuthorRef {
            uuid: "existing-uuid".to_string(),
            first_name: "Zqx".to_string(),
            last_name: "Wvb".to_string(),
            orcid: Some("https://orcid.org/0000-0001-9367-1791".to_string()),
        })
        .await
        .unwrap();

    // Same ORCID, but the stored name shares nothing with the incoming one,
    // so the match is rejected and a new node is created.
    let uuid = resolve_author(
        &store,
        &author("Fernando", "Plazas-Nino", Some("0000-0001-9367-1791"), 1),
        &config,
    )
    .await
    .unwrap();

    assert_ne!(uuid, "existing-uuid");
    assert_eq!(store.author_count(), 2);
}

#[tokio::test]
async fn test_resolve_matches_by_initial_and_lastname() {
    let store = MemoryStore::new();
    let config = Config::default();

    store
        .create_author(&AuthorRef {
            uuid: "existing-uuid".to_string(),
            first_name: "W".to_string(),
            last_name: "Usher".to_string(),
            orcid: None,
        })
        .await
        .unwrap();

    let uuid = resolve_author(&store, &author("Will", "Usher", None, 1), &config)
        .await
        .unwrap();

    assert_eq!(uuid, "existing-uuid");
    assert_eq!(store.author_count(), 1);
}

#[tokio::test]
async fn test_upsert_creates_article_with_ranked_authors() {
    let store = MemoryStore::new();
    let config = Config::default();

    let record = article(
        "10.1371/journal.pclm.0000331",
        vec![
            author("Will", "Usher", Some("0000-0001-9367-1791"), 1),
            author("Vignesh", "Sridharan", None, 2),
        ],
    );

    let created = upsert_article(&store, &record, &config).await.unwrap();
    assert!(created);
    assert_eq!(store.article_count(), 1);
    assert_eq!(store.author_count(), 2);
    assert_eq!(store.relationship_count(), 2);
}

#[tokio::test]
async fn test_upsert_is_idempotent() {
    let store = MemoryStore::new();
    let config = Config::default();

    let record = article(
        "10.1371/journal.pclm.0000331",
        vec![author("Will", "Usher", None, 1)],
    );

    assert!(upsert_article(&store, &record, &config).await.unwrap());
    assert!(!upsert_article(&store, &record, &config).await.unwrap());

    assert_eq!(store.article_count(), 1);
    assert_eq!(store.author_count(), 1);
    assert_eq!(store.relationship_count(), 1);
}

#[tokio::test]
async fn test_duplicate_article_creation_is_a_conflict() {
    let store = MemoryStore::new();
    let record = article("10.1371/journal.pclm.0000331", Vec::new());

    store.create_article("uuid-1", &record).await.unwrap();
    let err = store.create_article("uuid-2", &record).await.unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));
}

#[tokio::test]
async fn test_relationship_creation_is_merge_on_existing() {
    let store = MemoryStore::new();

    store.create_author_of("a", "b", 1).await.unwrap();
    store.create_author_of("a", "b", 5).await.unwrap();

    assert_eq!(store.relationship_count(), 1);
    assert_eq!(store.relationship_rank("a", "b"), Some(1));
}
