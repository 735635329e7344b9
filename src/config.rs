//! Client configuration
//!
//! [`ClientConfig`] is built once at startup, either through its builder
//! methods or from the process environment, and handed to
//! [`PubMedClient`](crate::PubMedClient).

use std::time::Duration;

use crate::cache::{CacheBackendConfig, CacheConfig};
use crate::rate_limit::ConcurrencyGate;
use crate::retry::RetryConfig;

const DEFAULT_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";
const DEFAULT_CONCURRENCY_WITH_KEY: usize = 10;
const DEFAULT_CONCURRENCY_WITHOUT_KEY: usize = 3;

/// Configuration for the upstream client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// NCBI API key; raises the upstream rate limit when present
    pub api_key: Option<String>,
    /// E-utilities base URL, without trailing slash
    pub base_url: Option<String>,
    /// Concurrency limit used when an API key is configured
    pub concurrency_with_key: usize,
    /// Concurrency limit used without an API key
    pub concurrency_without_key: usize,
    /// Explicit concurrency limit overriding both presets
    pub max_concurrency: Option<usize>,
    /// Total timeout of a single HTTP attempt
    pub timeout: Duration,
    /// Retry policy for transient failures
    pub retry_config: RetryConfig,
    /// Response cache settings
    pub cache: CacheConfig,
    /// User agent sent upstream
    pub user_agent: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            concurrency_with_key: DEFAULT_CONCURRENCY_WITH_KEY,
            concurrency_without_key: DEFAULT_CONCURRENCY_WITHOUT_KEY,
            max_concurrency: None,
            timeout: Duration::from_secs(30),
            retry_config: RetryConfig::default(),
            cache: CacheConfig::default(),
            user_agent: None,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read settings from the process environment
    ///
    /// Recognised variables: `NCBI_API_KEY`, `EUTILS_BASE_URL`,
    /// `CONCURRENCY_LIMIT_WITH_KEY`, `CONCURRENCY_LIMIT_WITHOUT_KEY`,
    /// `CACHE_TTL` (seconds), `REDIS_HOST` and `REDIS_PORT`. Unset or
    /// unparsable values keep their defaults. A Redis backend is selected
    /// only when `REDIS_HOST` is set and the `cache-redis` feature is on.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("NCBI_API_KEY") {
            config = config.with_api_key(key);
        }
        if let Some(url) = non_empty("EUTILS_BASE_URL") {
            config = config.with_base_url(url);
        }
        if let Some(limit) = non_empty("CONCURRENCY_LIMIT_WITH_KEY").and_then(|v| v.parse().ok()) {
            config.concurrency_with_key = limit;
        }
        if let Some(limit) =
            non_empty("CONCURRENCY_LIMIT_WITHOUT_KEY").and_then(|v| v.parse().ok())
        {
            config.concurrency_without_key = limit;
        }
        if let Some(ttl) = non_empty("CACHE_TTL").and_then(|v| v.parse::<u64>().ok()) {
            config.cache.time_to_live = Duration::from_secs(ttl);
        }
        if let Some(host) = non_empty("REDIS_HOST") {
            let port = non_empty("REDIS_PORT").unwrap_or_else(|| "6379".to_string());
            config.cache.backend = CacheBackendConfig::redis_or_memory(format!(
                "redis://{}:{}/0",
                host, port
            ));
        }

        config
    }

    pub fn with_api_key<S: Into<String>>(mut self, api_key: S) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Override the credential-based concurrency presets
    pub fn with_max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = Some(limit);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    pub fn with_cache_config(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache.time_to_live = ttl;
        self
    }

    pub fn with_user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn effective_base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
            .unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn effective_user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(|| format!("pubmed-gateway/{}", env!("CARGO_PKG_VERSION")))
    }

    /// Concurrency limit that applies with the current credentials
    pub fn effective_concurrency(&self) -> usize {
        match (self.max_concurrency, &self.api_key) {
            (Some(limit), _) => limit,
            (None, Some(_)) => self.concurrency_with_key,
            (None, None) => self.concurrency_without_key,
        }
    }

    /// Parameters appended to every upstream request
    pub fn build_api_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(key) = &self.api_key {
            params.push(("api_key".to_string(), key.clone()));
        }
        params
    }

    pub fn create_gate(&self) -> ConcurrencyGate {
        ConcurrencyGate::new(self.effective_concurrency())
    }
}
