//! ESpell API operations for spell-checking search terms

use tracing::{info, instrument, warn};

use crate::cache::QueryParams;
use crate::error::{FailureKind, Outcome};
use crate::pubmed::models::SpellCheckResult;
use crate::pubmed::responses::ESpellResponse;

use super::{DATABASE, PubMedClient};

impl PubMedClient {
    /// Ask ESpell for a corrected version of `query`
    ///
    /// On upstream failure this returns a result without a correction.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use pubmed_gateway::PubMedClient;
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     let client = PubMedClient::new();
    ///     let result = client.spell_check("asthmaa").await;
    ///     if result.has_correction {
    ///         println!("Did you mean: {:?}", result.corrected_query);
    ///     }
    /// }
    /// ```
    pub async fn spell_check(&self, query: &str) -> SpellCheckResult {
        self.try_spell_check(query)
            .await
            .found()
            .unwrap_or_else(|| SpellCheckResult::no_correction(query))
    }

    /// [`spell_check`](Self::spell_check) as an [`Outcome`]
    ///
    /// `Found` whenever upstream answered, even without a correction.
    #[instrument(skip(self), fields(query = %query))]
    pub async fn try_spell_check(&self, query: &str) -> Outcome<SpellCheckResult> {
        let mut params = QueryParams::new();
        params.insert("db".to_string(), DATABASE.to_string());
        params.insert("term".to_string(), query.to_string());
        params.insert("retmode".to_string(), "json".to_string());

        let url = self.endpoint("espell.fcgi");
        match self
            .fetcher()
            .fetch_json::<ESpellResponse>(&url, params)
            .await
        {
            Ok(response) => {
                let result = SpellCheckResult::new(query, response.result.corrected);
                if result.has_correction {
                    info!(corrected = ?result.corrected_query, "Spelling correction found");
                }
                Outcome::Found(result)
            }
            Err(e) => {
                warn!(error = %e, "ESpell request failed");
                Outcome::Failed(FailureKind::from(&e))
            }
        }
    }
}
