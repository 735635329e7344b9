//! Common test utilities for the mocked and real-API integration tests

#![allow(dead_code)]

use std::time::Duration;

use pubmed_gateway::{CacheConfig, ClientConfig, PubMedClient, ResponseCache, RetryConfig};
use serde_json::{Value, json};
use wiremock::MockServer;

/// Retry policy with the default attempt budget but millisecond backoff
pub fn fast_retry() -> RetryConfig {
    RetryConfig::new().with_base_delay(Duration::from_millis(10))
}

/// Configuration pointing at the mock server
pub fn mock_config(mock_server: &MockServer) -> ClientConfig {
    ClientConfig::new()
        .with_base_url(mock_server.uri())
        .with_retry_config(fast_retry())
}

/// Client with a fresh in-memory cache
pub fn create_mock_client(mock_server: &MockServer) -> PubMedClient {
    let config = mock_config(mock_server);
    let cache = ResponseCache::memory(&CacheConfig::default());
    PubMedClient::with_parts(config, reqwest::Client::new(), Some(cache))
}

/// Client without a cache, so every call reaches the mock server
pub fn create_uncached_mock_client(mock_server: &MockServer) -> PubMedClient {
    PubMedClient::with_parts(mock_config(mock_server), reqwest::Client::new(), None)
}

pub fn esearch_json(ids: &[&str]) -> Value {
    json!({
        "header": {"type": "esearch", "version": "0.3"},
        "esearchresult": {
            "count": ids.len().to_string(),
            "retmax": ids.len().to_string(),
            "retstart": "0",
            "idlist": ids,
        }
    })
}

/// EFetch document with a single article
pub fn article_xml(pmid: &str, title: &str) -> String {
    format!(
        r#"<?xml version="1.0" ?>
<!DOCTYPE PubmedArticleSet PUBLIC "-//NLM//DTD PubMedArticle, 1st January 2025//EN" "https://dtd.nlm.nih.gov/ncbi/pubmed/out/pubmed_250101.dtd">
<PubmedArticleSet>
    <PubmedArticle>
        <MedlineCitation Status="MEDLINE" Owner="NLM">
            <PMID Version="1">{pmid}</PMID>
            <Article PubModel="Print">
                <Journal>
                    <JournalIssue CitedMedium="Internet">
                        <Volume>12</Volume>
                        <Issue>3</Issue>
                        <PubDate><Year>2021</Year><Month>Mar</Month></PubDate>
                    </JournalIssue>
                    <Title>Journal of Tests</Title>
                </Journal>
                <ArticleTitle>{title}</ArticleTitle>
                <Pagination><MedlinePgn>100-110</MedlinePgn></Pagination>
                <Abstract>
                    <AbstractText>Abstract of {pmid}.</AbstractText>
                </Abstract>
                <AuthorList CompleteYN="Y">
                    <Author ValidYN="Y"><LastName>Smith</LastName><ForeName>John</ForeName><Initials>J</Initials></Author>
                </AuthorList>
            </Article>
        </MedlineCitation>
        <PubmedData>
            <ArticleIdList>
                <ArticleId IdType="pubmed">{pmid}</ArticleId>
            </ArticleIdList>
        </PubmedData>
    </PubmedArticle>
</PubmedArticleSet>"#
    )
}

/// EFetch answer for an id that does not exist
pub const EMPTY_ARTICLE_SET: &str = r#"<?xml version="1.0" ?>
<PubmedArticleSet></PubmedArticleSet>"#;

pub mod integration_test_utils {
    use super::*;

    /// Known, stable PMIDs used by the real API tests
    pub const TEST_PMIDS_STR: [&str; 3] = ["31978945", "33515491", "25760099"];

    /// Whether real API tests should run: feature on and `PUBMED_REAL_API_TESTS` set
    pub fn should_run_real_api_tests() -> bool {
        #[cfg(not(feature = "integration-tests"))]
        {
            false
        }

        #[cfg(feature = "integration-tests")]
        {
            std::env::var("PUBMED_REAL_API_TESTS").is_ok()
        }
    }

    /// Client against the real service, configured from the environment
    pub fn create_test_client() -> PubMedClient {
        PubMedClient::with_config(ClientConfig::from_env())
    }
}
