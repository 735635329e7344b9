//! ESummary API operations for fetching lightweight article metadata

use tracing::{debug, instrument, warn};

use crate::cache::QueryParams;
use crate::error::{FailureKind, Outcome};
use crate::pubmed::models::ArticleSummary;
use crate::pubmed::responses::{ESummaryDocSum, ESummaryResponse};

use super::{DATABASE, PubMedClient};

impl PubMedClient {
    /// Fetch summaries for `ids` in a single ESummary call
    ///
    /// An empty slice returns immediately without a request. Records that
    /// fail to decode are logged and skipped; the rest are still returned.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use pubmed_gateway::PubMedClient;
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     let client = PubMedClient::new();
    ///     let summaries = client.get_summaries(&["31978945", "33515491"]).await;
    ///     for summary in &summaries {
    ///         println!("{}: {} ({})", summary.pmid, summary.title, summary.pub_date);
    ///     }
    /// }
    /// ```
    pub async fn get_summaries<S: AsRef<str>>(&self, ids: &[S]) -> Vec<ArticleSummary> {
        self.try_get_summaries(ids).await.unwrap_or_empty()
    }

    /// [`get_summaries`](Self::get_summaries) as an [`Outcome`]
    #[instrument(skip(self, ids), fields(ids_count = ids.len()))]
    pub async fn try_get_summaries<S: AsRef<str>>(&self, ids: &[S]) -> Outcome<Vec<ArticleSummary>> {
        if ids.is_empty() {
            return Outcome::Empty;
        }

        let joined = ids.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(",");
        let mut params = QueryParams::new();
        params.insert("db".to_string(), DATABASE.to_string());
        params.insert("id".to_string(), joined);
        params.insert("retmode".to_string(), "json".to_string());

        let url = self.endpoint("esummary.fcgi");
        match self
            .fetcher()
            .fetch_json::<ESummaryResponse>(&url, params)
            .await
        {
            Ok(response) => Outcome::from_list(summaries_from_response(response)),
            Err(e) => {
                warn!(error = %e, "ESummary request failed");
                Outcome::Failed(FailureKind::from(&e))
            }
        }
    }
}

/// Decode each per-uid document in `uids` order, skipping bad ones
pub(crate) fn summaries_from_response(response: ESummaryResponse) -> Vec<ArticleSummary> {
    let Some(mut result) = response.result else {
        debug!("ESummary response has no result section");
        return Vec::new();
    };

    let mut summaries = Vec::with_capacity(result.uids.len());
    for uid in &result.uids {
        let Some(doc_value) = result.documents.remove(uid) else {
            warn!(uid = %uid, "UID not found in ESummary response");
            continue;
        };

        let doc: ESummaryDocSum = match serde_json::from_value(doc_value) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(uid = %uid, error = %e, "Skipping malformed ESummary record");
                continue;
            }
        };

        if let Some(error) = &doc.error {
            warn!(uid = %uid, error = %error, "ESummary returned error for UID");
            continue;
        }

        summaries.push(ArticleSummary {
            pmid: doc.uid,
            title: doc.title,
            pub_date: doc.pubdate,
            journal: doc.source,
            authors: doc.authors.into_iter().map(|a| a.name).collect(),
        });
    }

    summaries
}
