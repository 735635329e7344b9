//! PubMed E-utilities gateway
//!
//! Every operation comes in two flavours: a plain one that collapses "nothing
//! found" and "upstream failed" into an empty value, and a `try_*` one that
//! returns an [`Outcome`] keeping the two apart. Neither ever returns an error.

mod efetch;
mod elink;
mod espell;
mod summary;

use std::sync::OnceLock;

use regex::Regex;
use reqwest::Client;
use tracing::{debug, info, instrument, warn};

use crate::cache::{QueryParams, ResponseCache, create_cache};
use crate::config::ClientConfig;
use crate::error::{FailureKind, Outcome};
use crate::fetcher::ResilientFetcher;
use crate::pubmed::responses::ESearchResult;

pub(crate) const DATABASE: &str = "pubmed";

/// Client for the PubMed E-utilities endpoints
///
/// Cheap to clone; clones share the HTTP connection pool, the concurrency
/// gate and the response cache.
#[derive(Clone)]
pub struct PubMedClient {
    fetcher: ResilientFetcher,
    base_url: String,
}

impl PubMedClient {
    /// Create a client with default configuration
    ///
    /// No API key, so at most 3 concurrent upstream requests, and an
    /// in-memory response cache.
    ///
    /// # Example
    ///
    /// ```
    /// use pubmed_gateway::PubMedClient;
    ///
    /// let client = PubMedClient::new();
    /// ```
    pub fn new() -> Self {
        Self::with_config(ClientConfig::new())
    }

    /// Create a client with custom configuration
    ///
    /// Builds the HTTP client and the cache backend described by `config`.
    ///
    /// # Example
    ///
    /// ```
    /// use pubmed_gateway::{ClientConfig, PubMedClient};
    ///
    /// let config = ClientConfig::new().with_api_key("your_api_key_here");
    /// let client = PubMedClient::with_config(config);
    /// ```
    pub fn with_config(config: ClientConfig) -> Self {
        let http = Client::builder()
            .user_agent(config.effective_user_agent())
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to build configured HTTP client, using defaults");
                Client::new()
            });
        let cache = create_cache(&config.cache);
        Self::with_parts(config, http, cache)
    }

    /// Create a client around an existing HTTP client and cache handle
    ///
    /// `cache` may be `None`, in which case every request goes upstream.
    pub fn with_parts(config: ClientConfig, http: Client, cache: Option<ResponseCache>) -> Self {
        info!(
            concurrency = config.effective_concurrency(),
            cache_enabled = cache.is_some(),
            "PubMed client initialized"
        );
        if cache.is_none() {
            warn!("No response cache provided, caching is disabled");
        }

        let base_url = config.effective_base_url().to_string();
        Self {
            fetcher: ResilientFetcher::new(http, cache, &config),
            base_url,
        }
    }

    /// The response cache, if one is configured
    pub fn cache(&self) -> Option<&ResponseCache> {
        self.fetcher.cache()
    }

    pub(crate) fn fetcher(&self) -> &ResilientFetcher {
        &self.fetcher
    }

    pub(crate) fn endpoint(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, name)
    }

    /// Search PubMed and return matching PMIDs, newest first
    ///
    /// # Arguments
    ///
    /// * `query` - Search term
    /// * `field` - Field tag such as `[AU]`; applied as `(query)[AU]` unless
    ///   the query already carries a bracketed tag
    /// * `max_results` - Upper bound on returned ids
    /// * `start_date`, `end_date` - Publication date bounds (`YYYY/MM/DD`)
    ///
    /// Returns an empty list on any upstream failure.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use pubmed_gateway::PubMedClient;
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     let client = PubMedClient::new();
    ///     let pmids = client.search("smith", Some("[AU]"), 10, Some("2020/01/01"), None).await;
    ///     println!("{:?}", pmids);
    /// }
    /// ```
    pub async fn search(
        &self,
        query: &str,
        field: Option<&str>,
        max_results: usize,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Vec<String> {
        self.try_search(query, field, max_results, start_date, end_date)
            .await
            .unwrap_or_empty()
    }

    /// [`search`](Self::search), keeping "no hits" and "failed" apart
    #[instrument(skip(self), fields(query = %query, max_results = max_results))]
    pub async fn try_search(
        &self,
        query: &str,
        field: Option<&str>,
        max_results: usize,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Outcome<Vec<String>> {
        let mut params = QueryParams::new();
        params.insert("db".to_string(), DATABASE.to_string());
        params.insert("term".to_string(), build_search_term(query, field));
        params.insert("retmode".to_string(), "json".to_string());
        params.insert("retmax".to_string(), max_results.to_string());
        params.insert("sort".to_string(), "date".to_string());
        if let Some(start) = start_date {
            params.insert("datetype".to_string(), "pdat".to_string());
            params.insert("mindate".to_string(), start.to_string());
        }
        if let Some(end) = end_date {
            params.insert("datetype".to_string(), "pdat".to_string());
            params.insert("maxdate".to_string(), end.to_string());
        }

        self.esearch(params).await
    }

    /// Run ESearch with prepared parameters and return the id list
    pub(crate) async fn esearch(&self, params: QueryParams) -> Outcome<Vec<String>> {
        let url = self.endpoint("esearch.fcgi");
        match self.fetcher.fetch_json::<ESearchResult>(&url, params).await {
            Ok(result) => {
                if let Some(error) = &result.esearchresult.error {
                    warn!(error = %error, "ESearch reported an error");
                }
                let ids = result.esearchresult.idlist;
                debug!(count = ids.len(), "ESearch returned ids");
                Outcome::from_list(ids)
            }
            Err(e) => {
                warn!(error = %e, "ESearch request failed");
                Outcome::Failed(FailureKind::from(&e))
            }
        }
    }
}

impl Default for PubMedClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply `field` to `query` unless the query already carries a field tag
///
/// A field tag is two to four ASCII letters in brackets, e.g. `[AU]` or `[MESH]`.
///
/// # Example
///
/// ```
/// use pubmed_gateway::pubmed::build_search_term;
///
/// assert_eq!(build_search_term("cancer", Some("[AU]")), "(cancer)[AU]");
/// assert_eq!(build_search_term("cancer[TI]", Some("[AU]")), "cancer[TI]");
/// assert_eq!(build_search_term("cancer", None), "cancer");
/// ```
pub fn build_search_term(query: &str, field: Option<&str>) -> String {
    static FIELD_TAG: OnceLock<Regex> = OnceLock::new();
    let re = FIELD_TAG
        .get_or_init(|| Regex::new(r"\[[A-Za-z]{2,4}\]").expect("Failed to compile field tag regex"));

    match field {
        Some(field) if !field.is_empty() && !re.is_match(query) => format!("({}){}", query, field),
        _ => query.to_string(),
    }
}
