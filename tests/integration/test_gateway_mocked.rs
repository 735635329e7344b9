//! Integration tests for the PubMed gateway operations using mocked HTTP responses
//!
//! Check request parameters, response shaping and the empty-versus-failed
//! distinction of every operation.

mod common;

use pubmed_gateway::{FailureKind, Outcome};
use serde_json::json;
use tracing_test::traced_test;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{
    EMPTY_ARTICLE_SET, article_xml, create_mock_client, create_uncached_mock_client, esearch_json,
};

fn query_value(request: &wiremock::Request, key: &str) -> Option<String> {
    request
        .url
        .query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

// ================================================================================================
// search
// ================================================================================================

#[tokio::test]
async fn test_search_wraps_query_with_field() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .and(query_param("term", "(cancer)[AU]"))
        .and(query_param("db", "pubmed"))
        .and(query_param("retmode", "json"))
        .and(query_param("retmax", "5"))
        .and(query_param("sort", "date"))
        .respond_with(ResponseTemplate::new(200).set_body_json(esearch_json(&["3", "2", "1"])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_mock_client(&mock_server);
    let ids = client.search("cancer", Some("[AU]"), 5, None, None).await;

    assert_eq!(ids, vec!["3", "2", "1"]);
}

#[tokio::test]
async fn test_search_keeps_existing_field_tag() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .and(query_param("term", "breast cancer[TI]"))
        .respond_with(ResponseTemplate::new(200).set_body_json(esearch_json(&["7"])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_mock_client(&mock_server);
    let ids = client
        .search("breast cancer[TI]", Some("[AU]"), 10, None, None)
        .await;

    assert_eq!(ids, vec!["7"]);
}

#[tokio::test]
async fn test_search_date_params_only_when_supplied() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .respond_with(ResponseTemplate::new(200).set_body_json(esearch_json(&["1"])))
        .mount(&mock_server)
        .await;

    let client = create_uncached_mock_client(&mock_server);
    client.search("asthma", None, 10, None, None).await;
    client
        .search("asthma", None, 10, Some("2020/01/01"), None)
        .await;
    client
        .search("asthma", None, 10, Some("2020/01/01"), Some("2020/12/31"))
        .await;

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);

    assert_eq!(query_value(&requests[0], "datetype"), None);
    assert_eq!(query_value(&requests[0], "mindate"), None);

    assert_eq!(query_value(&requests[1], "datetype").as_deref(), Some("pdat"));
    assert_eq!(query_value(&requests[1], "mindate").as_deref(), Some("2020/01/01"));
    assert_eq!(query_value(&requests[1], "maxdate"), None);

    assert_eq!(query_value(&requests[2], "maxdate").as_deref(), Some("2020/12/31"));
}

#[tokio::test]
async fn test_search_outcomes() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("term", "nothing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(esearch_json(&[])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(query_param("term", "bad"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(query_param("term", "down"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&mock_server)
        .await;

    let client = create_mock_client(&mock_server);

    assert_eq!(
        client.try_search("nothing", None, 10, None, None).await,
        Outcome::Empty
    );
    assert_eq!(
        client.try_search("bad", None, 10, None, None).await,
        Outcome::Failed(FailureKind::Upstream(400))
    );
    assert_eq!(
        client.try_search("down", None, 10, None, None).await,
        Outcome::Failed(FailureKind::Transient)
    );

    // The plain variant collapses both into an empty list
    assert!(client.search("bad", None, 10, None, None).await.is_empty());
}

// ================================================================================================
// spell_check
// ================================================================================================

#[tokio::test]
async fn test_spell_check_correction() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/espell.fcgi"))
        .and(query_param("term", "asthmaa"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "es-result": {"database": "pubmed", "query": "asthmaa", "corrected": "asthma"}
        })))
        .mount(&mock_server)
        .await;

    let client = create_mock_client(&mock_server);
    let result = client.spell_check("asthmaa").await;

    assert_eq!(result.original_query, "asthmaa");
    assert_eq!(result.corrected_query.as_deref(), Some("asthma"));
    assert!(result.has_correction);
}

#[tokio::test]
async fn test_spell_check_failure_returns_no_correction() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;

    let client = create_mock_client(&mock_server);
    let result = client.spell_check("asthmaa").await;

    assert_eq!(result.original_query, "asthmaa");
    assert!(result.corrected_query.is_none());
    assert!(!result.has_correction);
    assert!(client.try_spell_check("asthmaa").await.is_failed());
}

// ================================================================================================
// get_summaries
// ================================================================================================

#[tokio::test]
async fn test_get_summaries_empty_input_makes_no_request() {
    let mock_server = MockServer::start().await;
    let client = create_mock_client(&mock_server);

    let no_ids: [&str; 0] = [];
    assert!(client.get_summaries(&no_ids).await.is_empty());
    assert_eq!(client.try_get_summaries(&no_ids).await, Outcome::Empty);
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
#[traced_test]
async fn test_get_summaries_skips_malformed_record() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/esummary.fcgi"))
        .and(query_param("id", "1,2,3,4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "header": {"type": "esummary", "version": "0.3"},
            "result": {
                "uids": ["1", "2", "3", "4"],
                "1": {"uid": "1", "title": "One", "pubdate": "2020", "source": "J1",
                      "authors": [{"name": "Doe J", "authtype": "Author"}]},
                "2": {"uid": "2", "title": "Two", "pubdate": "2021", "source": "J2", "authors": []},
                "3": {"title": "Missing uid", "pubdate": "2022", "source": "J3", "authors": []},
                "4": {"uid": "4", "title": "Four", "pubdate": "2023", "source": "J4", "authors": []}
            }
        })))
        .mount(&mock_server)
        .await;

    let client = create_mock_client(&mock_server);
    let summaries = client.get_summaries(&["1", "2", "3", "4"]).await;

    let ids: Vec<_> = summaries.iter().map(|s| s.pmid.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "4"]);
    assert_eq!(summaries[0].authors, vec!["Doe J"]);
    assert_eq!(summaries[0].journal, "J1");
    assert!(logs_contain("Skipping malformed ESummary record"));
}

// ================================================================================================
// find_related_ids
// ================================================================================================

#[tokio::test]
async fn test_related_ids_without_linksets_skips_second_phase() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/elink.fcgi"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"linksets": []})))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .respond_with(ResponseTemplate::new(200).set_body_json(esearch_json(&["1"])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = create_mock_client(&mock_server);
    assert!(client.find_related_ids("123", 10).await.is_empty());
    assert_eq!(client.try_find_related_ids("123", 10).await, Outcome::Empty);
}

#[tokio::test]
async fn test_related_ids_two_phases() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/elink.fcgi"))
        .and(query_param("id", "123"))
        .and(query_param("linkname", "pubmed_pubmed"))
        .and(query_param("cmd", "neighbor_history"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "header": {"type": "elink", "version": "0.3"},
            "linksets": [{
                "dbfrom": "pubmed",
                "ids": ["123"],
                "linksetdbs": [{"dbto": "pubmed", "linkname": "pubmed_pubmed", "querykey": "1"}],
                "webenv": "MCID_abc"
            }]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .and(query_param("WebEnv", "MCID_abc"))
        .and(query_param("query_key", "1"))
        .and(query_param("retmax", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(esearch_json(&["123", "456", "789"])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_mock_client(&mock_server);
    let ids = client.find_related_ids("123", 3).await;
    assert_eq!(ids, vec!["123", "456", "789"]);
}

#[tokio::test]
async fn test_related_ids_phase_one_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/elink.fcgi"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = create_mock_client(&mock_server);
    assert_eq!(
        client.try_find_related_ids("123", 10).await,
        Outcome::Failed(FailureKind::Upstream(404))
    );
}

// ================================================================================================
// fetch_details
// ================================================================================================

#[tokio::test]
async fn test_fetch_details_parses_article() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/efetch.fcgi"))
        .and(query_param("id", "31978945"))
        .and(query_param("retmode", "xml"))
        .and(query_param("rettype", "abstract"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(article_xml("31978945", "A test title")),
        )
        .mount(&mock_server)
        .await;

    let client = create_mock_client(&mock_server);
    let article = client
        .fetch_details("31978945")
        .await
        .expect("Article should be parsed");

    assert_eq!(article.pmid(), "31978945");
    assert_eq!(article.title, "A test title");
    assert_eq!(article.journal, "Journal of Tests");
    assert_eq!(article.pub_date, "2021");
    assert_eq!(article.authors, vec!["Smith J"]);
    assert_eq!(article.volume.as_deref(), Some("12"));
    assert_eq!(article.pages.as_deref(), Some("100-110"));
    assert_eq!(article.link(), "https://pubmed.ncbi.nlm.nih.gov/31978945/");
}

#[tokio::test]
async fn test_fetch_details_unknown_id_is_empty() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/efetch.fcgi"))
        .respond_with(ResponseTemplate::new(200).set_body_string(EMPTY_ARTICLE_SET))
        .mount(&mock_server)
        .await;

    let client = create_mock_client(&mock_server);
    assert!(client.fetch_details("99999999").await.is_none());
    assert_eq!(client.try_fetch_details("99999999").await, Outcome::Empty);
}

#[tokio::test]
#[traced_test]
async fn test_fetch_details_malformed_xml() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/efetch.fcgi"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<PubmedArticleSet><PubmedArticle></PubmedArticleSet>"),
        )
        .mount(&mock_server)
        .await;

    let client = create_mock_client(&mock_server);
    assert!(client.fetch_details("1").await.is_none());
    assert_eq!(
        client.try_fetch_details("1").await,
        Outcome::Failed(FailureKind::Payload)
    );
    assert!(logs_contain("Error processing article data"));
}

#[tokio::test]
async fn test_fetch_details_cached() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/efetch.fcgi"))
        .respond_with(ResponseTemplate::new(200).set_body_string(article_xml("5", "Cached")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_mock_client(&mock_server);
    let first = client.fetch_details("5").await;
    let second = client.fetch_details("5").await;

    assert!(first.is_some());
    assert_eq!(first, second);
}

// ================================================================================================
// tracing spans
// ================================================================================================

#[tokio::test]
#[traced_test]
async fn test_spans_record_max_results() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .respond_with(ResponseTemplate::new(200).set_body_json(esearch_json(&["1"])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/elink.fcgi"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"linksets": []})))
        .mount(&mock_server)
        .await;

    let client = create_mock_client(&mock_server);
    client.try_search("asthma", None, 7, None, None).await;
    client.try_find_related_ids("123", 4).await;

    assert!(logs_contain("max_results=7"));
    assert!(logs_contain("max_results=4"));
}
