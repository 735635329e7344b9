//! EFetch API operations for full article records

use tracing::{debug, error, instrument, warn};

use crate::cache::QueryParams;
use crate::error::{FailureKind, Outcome};
use crate::pubmed::models::Article;
use crate::pubmed::parser::parse_article;

use super::{DATABASE, PubMedClient};

impl PubMedClient {
    /// Fetch and parse the full record of one article
    ///
    /// Returns `None` when the id is unknown upstream, the document has no
    /// article in it, the request failed, or the XML could not be parsed.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use pubmed_gateway::PubMedClient;
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     let client = PubMedClient::new();
    ///     if let Some(article) = client.fetch_details("31978945").await {
    ///         println!("{}", article.to_ama_citation());
    ///     }
    /// }
    /// ```
    pub async fn fetch_details(&self, id: &str) -> Option<Article> {
        self.try_fetch_details(id).await.found()
    }

    /// [`fetch_details`](Self::fetch_details) as an [`Outcome`]
    #[instrument(skip(self), fields(pmid = %id))]
    pub async fn try_fetch_details(&self, id: &str) -> Outcome<Article> {
        let mut params = QueryParams::new();
        params.insert("db".to_string(), DATABASE.to_string());
        params.insert("id".to_string(), id.to_string());
        params.insert("retmode".to_string(), "xml".to_string());
        params.insert("rettype".to_string(), "abstract".to_string());

        let url = self.endpoint("efetch.fcgi");
        let xml = match self.fetcher().fetch_text(&url, params).await {
            Ok(xml) => xml,
            Err(e) => {
                warn!(error = %e, "EFetch request failed");
                return Outcome::Failed(FailureKind::from(&e));
            }
        };

        if xml.trim().is_empty() {
            debug!("EFetch returned an empty document");
            return Outcome::Empty;
        }

        match parse_article(&xml, id) {
            Ok(Some(article)) => Outcome::Found(article),
            Ok(None) => Outcome::Empty,
            Err(e) => {
                error!(error = %e, "Error processing article data");
                Outcome::Failed(FailureKind::from(&e))
            }
        }
    }
}
