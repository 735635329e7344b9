//! ELink API operations for related-article discovery

use tracing::{debug, instrument, warn};

use crate::cache::QueryParams;
use crate::error::{FailureKind, Outcome};
use crate::pubmed::responses::ELinkResponse;

use super::{DATABASE, PubMedClient};

impl PubMedClient {
    /// PMIDs of articles related to `source_id`
    ///
    /// Two requests: ELink with `cmd=neighbor_history` stores the neighbour
    /// set on the history server, then ESearch reads up to `max_results` ids
    /// from it. If the first response lacks a session token or query key the
    /// second request is not made.
    ///
    /// The result may include `source_id` itself.
    pub async fn find_related_ids(&self, source_id: &str, max_results: usize) -> Vec<String> {
        self.try_find_related_ids(source_id, max_results)
            .await
            .unwrap_or_empty()
    }

    /// [`find_related_ids`](Self::find_related_ids) as an [`Outcome`]
    #[instrument(skip(self), fields(source_id = %source_id, max_results = max_results))]
    pub async fn try_find_related_ids(
        &self,
        source_id: &str,
        max_results: usize,
    ) -> Outcome<Vec<String>> {
        let mut params = QueryParams::new();
        params.insert("db".to_string(), DATABASE.to_string());
        params.insert("id".to_string(), source_id.to_string());
        params.insert("linkname".to_string(), "pubmed_pubmed".to_string());
        params.insert("cmd".to_string(), "neighbor_history".to_string());
        params.insert("retmode".to_string(), "json".to_string());

        let url = self.endpoint("elink.fcgi");
        let response = match self
            .fetcher()
            .fetch_json::<ELinkResponse>(&url, params)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "ELink request failed");
                return Outcome::Failed(FailureKind::from(&e));
            }
        };

        let Some(related) = response.related_set() else {
            debug!("ELink returned no usable history set");
            return Outcome::Empty;
        };

        let mut params = QueryParams::new();
        params.insert("db".to_string(), DATABASE.to_string());
        params.insert("query_key".to_string(), related.query_key);
        params.insert("WebEnv".to_string(), related.web_env);
        params.insert("retmode".to_string(), "json".to_string());
        params.insert("retmax".to_string(), max_results.to_string());

        self.esearch(params).await
    }
}
