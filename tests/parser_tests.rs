use chrono::Utc;
use doi_graph::parse::{clean_html, parse_author, parse_metadata, title_case};
use doi_graph::AuthorRecord;
use serde_json::json;

#[test]
fn test_clean_html_strips_tags() {
    let text = "<jats:title>Abstract</jats:title><jats:p>Beneficiaries</jats:p>";
    assert_eq!(clean_html(text), "AbstractBeneficiaries");
}

#[test]
fn test_clean_html_replaces_soft_hyphen() {
    assert_eq!(clean_html("renewa\u{ad}ble"), "renewa ble");
}

#[test]
fn test_clean_html_collapses_whitespace_and_entities() {
    assert_eq!(clean_html("Energy &amp; Climate"), "Energy & Climate");
    assert_eq!(clean_html("a\u{a0}b\u{202f}c"), "a b c");
    assert_eq!(clean_html("  spaced    out  "), "spaced out");
}

#[test]
fn test_clean_html_is_idempotent() {
    for text in [
        "<jats:title>Abstract</jats:title><jats:p>Beneficiaries</jats:p>",
        "renewa\u{ad}ble",
        "Energy &amp; Climate",
        "already clean",
    ] {
        let once = clean_html(text);
        assert_eq!(clean_html(&once), once);
    }
}

#[test]
fn test_title_case() {
    assert_eq!(title_case("lucy"), "Lucy");
    assert_eq!(title_case("ALLINGTON"), "Allington");
    assert_eq!(title_case("plazas-nino"), "Plazas-Nino");
}

#[test]
fn test_author_orcid_pending() {
    let fixture = json!({
        "fullName": "Allington, Lucy",
        "name": "Lucy",
        "surname": "Allington",
        "rank": 1,
        "pid": {
            "id": {
                "scheme": "orcid_pending",
                "value": "0000-0003-1801-899x",
            },
            "provenance": null,
        },
    });
    let actual = parse_author(&fixture);
    let expected = AuthorRecord {
        first_name: "Lucy".to_string(),
        last_name: "Allington".to_string(),
        orcid: Some("https://orcid.org/0000-0003-1801-899x".to_string()),
        rank: 1,
    };
    assert_eq!(actual, Some(expected));
}

#[test]
fn test_author_orcid() {
    let fixture = json!({
        "fullName": "Usher, Will",
        "name": "Will",
        "surname": "Usher",
        "rank": 5,
        "pid": {
            "id": {
                "scheme": "orcid",
                "value": "0000-0001-9367-1791",
            },
            "provenance": null,
        },
    });
    let actual = parse_author(&fixture);
    let expected = AuthorRecord {
        first_name: "Will".to_string(),
        last_name: "Usher".to_string(),
        orcid: Some("https://orcid.org/0000-0001-9367-1791".to_string()),
        rank: 5,
    };
    assert_eq!(actual, Some(expected));
}

#[test]
fn test_author_no_orcid() {
    let fixture = json!({
        "fullName": "Usher, Will",
        "name": "Will",
        "surname": "Usher",
        "rank": 5,
    });
    let actual = parse_author(&fixture);
    let expected = AuthorRecord {
        first_name: "Will".to_string(),
        last_name: "Usher".to_string(),
        orcid: None,
        rank: 5,
    };
    assert_eq!(actual, Some(expected));
}

#[test]
fn test_author_full_name_only_noise_is_dropped() {
    let fixture = json!({ "fullName": "not a name" });
    assert_eq!(parse_author(&fixture), None);
}

#[test]
fn test_author_full_name_fallback_splits() {
    let fixture = json!({ "fullName": "Vignesh Sridharan" });
    let actual = parse_author(&fixture).unwrap();
    assert_eq!(actual.first_name, "Vignesh");
    assert_eq!(actual.last_name, "Sridharan");
    assert_eq!(actual.rank, 1);

    let fixture = json!({ "fullName": "Fernando Antonio Plazas" });
    let actual = parse_author(&fixture).unwrap();
    assert_eq!(actual.first_name, "Fernando");
    assert_eq!(actual.last_name, "Antonio Plazas");
}

#[test]
fn test_author_overlapping_name_fields_are_stripped() {
    let fixture = json!({ "name": "Lucy", "surname": "Lucy Allington" });
    let actual = parse_author(&fixture).unwrap();
    assert_eq!(actual.first_name, "Lucy");
    assert_eq!(actual.last_name, "Allington");
}

#[test]
fn test_author_surname_only_is_split() {
    let fixture = json!({ "surname": "Will Usher" });
    let actual = parse_author(&fixture).unwrap();
    assert_eq!(actual.first_name, "Will");
    assert_eq!(actual.last_name, "Usher");
}

#[test]
fn test_author_single_token_surname_is_unparseable() {
    let fixture = json!({ "surname": "Usher" });
    assert_eq!(parse_author(&fixture), None);
}

fn zenodo_dataset_result() -> serde_json::Value {
    json!({
        "mainTitle": "CCG Starter Data Kit: Liberia",
        "publisher": "Zenodo",
        "type": "dataset",
        "description": ["A starter data kit for Liberia"],
        "publicationDate": "2023-01-16",
        "author": [
            {
                "fullName": "Allington, Lucy",
                "name": "Lucy",
                "surname": "Allington",
                "rank": 1,
                "pid": {
                    "id": {
                        "scheme": "orcid_pending",
                        "value": "0000-0003-1801-899x",
                    },
                },
            }
        ],
        "instance": [
            { "type": "Dataset", "publicationDate": "2023-01-16" }
        ],
    })
}

#[test]
fn test_parse_metadata_dataset() {
    let results = vec![zenodo_dataset_result()];
    let articles = parse_metadata(&results, "10.5281/zenodo.4650794", None).unwrap();

    assert_eq!(articles.len(), 1);
    let article = &articles[0];
    assert_eq!(article.doi, "10.5281/zenodo.4650794");
    assert_eq!(article.title, "CCG Starter Data Kit: Liberia");
    assert_eq!(article.abstract_text, "A starter data kit for Liberia");
    assert_eq!(article.journal, "");
    assert_eq!(article.issue, None);
    assert_eq!(article.volume, None);
    assert_eq!(article.publication_year, Some(2023));
    assert_eq!(article.publication_month, Some(1));
    assert_eq!(article.publication_day, Some(16));
    assert_eq!(article.publisher.as_deref(), Some("Zenodo"));
    assert_eq!(article.result_type, "dataset");
    assert_eq!(article.resource_type, "Dataset");
    assert_eq!(article.openalex, None);
    assert_eq!(article.cited_by_count, 0);
    assert_eq!(article.cited_by_count_date, Utc::now().date_naive());

    assert_eq!(article.authors.len(), 1);
    let author = &article.authors[0];
    assert_eq!(author.first_name, "Lucy");
    assert_eq!(author.last_name, "Allington");
    assert_eq!(
        author.orcid.as_deref(),
        Some("https://orcid.org/0000-0003-1801-899x")
    );
    assert_eq!(author.rank, 1);
}

#[test]
fn test_parse_metadata_publication_with_container() {
    let result = json!({
        "mainTitle": "<i>Modelling</i> pathways",
        "publisher": "PLOS",
        "type": "publication",
        "description": "An abstract",
        "container": { "name": "PLOS Climate", "iss": "9", "vol": "2" },
        "author": [
            { "name": "Will", "surname": "Usher", "rank": 1 },
            { "name": "Vignesh", "surname": "Sridharan", "rank": 2 }
        ],
        "instance": [
            { "type": "Article", "publicationDate": "2024-09-05" }
        ],
        "indicators": { "citationImpact": { "citationCount": 7 } },
    });
    let openalex = json!({
        "id": "https://openalex.org/W4123456789",
        "cited_by_count": 42,
    });

    let articles =
        parse_metadata(&[result], "10.1371/journal.pclm.0000331", Some(&openalex)).unwrap();
    let article = &articles[0];

    assert_eq!(article.title, "Modelling pathways");
    assert_eq!(article.journal, "PLOS Climate");
    assert_eq!(article.issue.as_deref(), Some("9"));
    assert_eq!(article.volume.as_deref(), Some("2"));
    assert_eq!(article.publication_year, Some(2024));
    assert_eq!(article.resource_type, "Article");
    assert_eq!(
        article.openalex.as_deref(),
        Some("https://openalex.org/W4123456789")
    );
    assert_eq!(article.cited_by_count, 42);
    assert_eq!(article.authors.len(), 2);
    assert_eq!(article.authors[1].rank, 2);
}

#[test]
fn test_parse_metadata_citation_count_falls_back_to_openaire() {
    let result = json!({
        "mainTitle": "A title",
        "type": "other",
        "publicationDate": "2022-03-01",
        "indicators": { "citationImpact": { "citationCount": 7 } },
    });
    let articles = parse_metadata(&[result], "10.5281/zenodo.1", None).unwrap();
    assert_eq!(articles[0].cited_by_count, 7);
}

#[test]
fn test_parse_metadata_unknown_result_type_fails_fast() {
    let result = json!({
        "mainTitle": "A title",
        "type": "patent",
        "publicationDate": "2022-03-01",
    });
    assert!(parse_metadata(&[result], "10.5281/zenodo.1", None).is_err());
}

#[test]
fn test_parse_metadata_unknown_resource_type_fails_fast() {
    let result = json!({
        "mainTitle": "A title",
        "type": "publication",
        "instance": [ { "type": "Blog Post", "publicationDate": "2022-03-01" } ],
    });
    assert!(parse_metadata(&[result], "10.5281/zenodo.1", None).is_err());
}

#[test]
fn test_parse_metadata_authors_without_names_are_skipped() {
    let result = json!({
        "mainTitle": "A title",
        "type": "other",
        "publicationDate": "2022-03-01",
        "author": [
            { "name": "Will", "surname": "Usher", "rank": 1 },
            { "fullName": "not a name" }
        ],
    });
    let articles = parse_metadata(&[result], "10.5281/zenodo.1", None).unwrap();
    assert_eq!(articles[0].authors.len(), 1);
}

#[test]
fn test_parse_metadata_missing_date_yields_no_parts() {
    let result = json!({
        "mainTitle": "A title",
        "type": "other",
    });
    let articles = parse_metadata(&[result], "10.5281/zenodo.1", None).unwrap();
    assert_eq!(articles[0].publication_year, None);
    assert_eq!(articles[0].publication_month, None);
    assert_eq!(articles[0].publication_day, None);
}
