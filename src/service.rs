//! Multi-step literature operations built on [`PubMedClient`]
//!
//! Each operation searches for ids first and then fans out one detail fetch
//! per id. Legs that fail are dropped; the remaining results keep the order
//! of the ids they came from.

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::pubmed::{Article, ArticleSummary, CitationResult, PubMedClient, SemanticSearchResult};

const DEFAULT_MAX_RESULTS: usize = 10;

/// Parameters of a literature search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    /// Field tag such as `[AU]`
    pub field: Option<String>,
    pub max_results: usize,
    /// `YYYY/MM/DD`
    pub start_date: Option<String>,
    /// `YYYY/MM/DD`
    pub end_date: Option<String>,
}

impl SearchRequest {
    pub fn new<S: Into<String>>(query: S) -> Self {
        Self {
            query: query.into(),
            field: None,
            max_results: DEFAULT_MAX_RESULTS,
            start_date: None,
            end_date: None,
        }
    }

    pub fn with_field<S: Into<String>>(mut self, field: S) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_start_date<S: Into<String>>(mut self, date: S) -> Self {
        self.start_date = Some(date.into());
        self
    }

    pub fn with_end_date<S: Into<String>>(mut self, date: S) -> Self {
        self.end_date = Some(date.into());
        self
    }
}

/// Builds the guideline query: practice guidelines with free full text
pub fn guideline_query(topic: &str) -> String {
    format!(
        "({}) AND (\"guideline\"[Publication Type] OR \"practice guideline\"[Publication Type]) AND \"free full text\"[Filter]",
        topic
    )
}

/// Search, summary, guideline, citation and related-article workflows
#[derive(Clone)]
pub struct LiteratureService {
    client: PubMedClient,
}

impl LiteratureService {
    pub fn new(client: PubMedClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &PubMedClient {
        &self.client
    }

    async fn search_ids(&self, request: &SearchRequest) -> Vec<String> {
        self.client
            .search(
                &request.query,
                request.field.as_deref(),
                request.max_results,
                request.start_date.as_deref(),
                request.end_date.as_deref(),
            )
            .await
    }

    /// Fetch full records for `ids` concurrently, dropping failures
    pub async fn fetch_articles(&self, ids: &[String]) -> Vec<Article> {
        if ids.is_empty() {
            return Vec::new();
        }

        let results = join_all(ids.iter().map(|id| self.client.fetch_details(id))).await;
        let articles: Vec<Article> = results.into_iter().flatten().collect();
        debug!(requested = ids.len(), fetched = articles.len(), "Detail fetches finished");
        articles
    }

    /// Full records for the articles matching `request`
    #[instrument(skip(self), fields(query = %request.query))]
    pub async fn search_articles(&self, request: &SearchRequest) -> Vec<Article> {
        let ids = self.search_ids(request).await;
        self.fetch_articles(&ids).await
    }

    /// Summaries for the articles matching `request`
    #[instrument(skip(self), fields(query = %request.query))]
    pub async fn search_summaries(&self, request: &SearchRequest) -> Vec<ArticleSummary> {
        let ids = self.search_ids(request).await;
        self.client.get_summaries(&ids).await
    }

    /// Clinical and practice guidelines on `topic` that have free full text
    #[instrument(skip(self))]
    pub async fn search_guidelines(&self, topic: &str, max_results: usize) -> Vec<Article> {
        let ids = self
            .client
            .search(&guideline_query(topic), None, max_results, None, None)
            .await;
        self.fetch_articles(&ids).await
    }

    /// AMA citations for the articles matching `request`
    #[instrument(skip(self), fields(query = %request.query))]
    pub async fn search_citations(&self, request: &SearchRequest) -> Vec<CitationResult> {
        self.search_articles(request)
            .await
            .iter()
            .map(Article::citation)
            .collect()
    }

    /// Articles related to `pmid`, ranked with a placeholder score
    ///
    /// This is a demonstration: neighbours come from ELink and the score is
    /// `max(0.1, 0.95 - 0.05 * rank)`, not a computed similarity.
    ///
    /// Returns `None` when the source article itself cannot be fetched.
    #[instrument(skip(self))]
    pub async fn semantic_search(
        &self,
        pmid: &str,
        max_results: usize,
    ) -> Option<Vec<SemanticSearchResult>> {
        self.client.fetch_details(pmid).await?;

        info!("Demo mode: using ELink neighbours as similar articles");
        let related: Vec<String> = self
            .client
            .find_related_ids(pmid, max_results)
            .await
            .into_iter()
            .filter(|id| id != pmid)
            .take(max_results)
            .collect();

        let results = self
            .fetch_articles(&related)
            .await
            .into_iter()
            .enumerate()
            .map(|(rank, article)| SemanticSearchResult {
                score: SemanticSearchResult::placeholder_score(rank),
                article,
            })
            .collect();
        Some(results)
    }
}
