//! Resilient HTTP execution
//!
//! Every upstream call goes through [`ResilientFetcher::fetch`]: cache lookup,
//! then a GET under the concurrency gate with retries, then cache population.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::cache::{QueryParams, ResponseCache, cache_key};
use crate::config::ClientConfig;
use crate::error::{FetchError, Result};
use crate::rate_limit::ConcurrencyGate;
use crate::retry::{RetryConfig, with_retry};

/// How a successful response body is decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Json,
    Text,
}

/// A decoded upstream response body
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
}

impl Payload {
    /// Unwrap a JSON payload
    pub fn into_json(self) -> Result<Value> {
        match self {
            Payload::Json(value) => Ok(value),
            Payload::Text(_) => Err(FetchError::UnexpectedPayload(
                "expected JSON, got text".to_string(),
            )),
        }
    }

    /// Unwrap a text payload
    pub fn into_text(self) -> Result<String> {
        match self {
            Payload::Text(text) => Ok(text),
            Payload::Json(_) => Err(FetchError::UnexpectedPayload(
                "expected text, got JSON".to_string(),
            )),
        }
    }

    // Text bodies are stored as a JSON string so both formats share one encoding
    fn to_cache_value(&self) -> serde_json::Result<String> {
        match self {
            Payload::Json(value) => serde_json::to_string(value),
            Payload::Text(text) => serde_json::to_string(text),
        }
    }

    fn from_cache_value(raw: &str, format: ResponseFormat) -> Option<Self> {
        let value: Value = serde_json::from_str(raw).ok()?;
        match format {
            ResponseFormat::Json => Some(Payload::Json(value)),
            ResponseFormat::Text => match value {
                Value::String(text) => Some(Payload::Text(text)),
                _ => None,
            },
        }
    }
}

/// Executes GET requests through the cache, the concurrency gate and the retry policy
#[derive(Clone)]
pub struct ResilientFetcher {
    http: Client,
    cache: Option<ResponseCache>,
    gate: ConcurrencyGate,
    api_params: Vec<(String, String)>,
    retry_config: RetryConfig,
    timeout: Duration,
}

impl ResilientFetcher {
    /// Assemble a fetcher from an existing HTTP client and optional cache
    ///
    /// The gate, retry policy, timeout and credentials come from `config`.
    pub fn new(http: Client, cache: Option<ResponseCache>, config: &ClientConfig) -> Self {
        Self {
            http,
            cache,
            gate: config.create_gate(),
            api_params: config.build_api_params(),
            retry_config: config.retry_config.clone(),
            timeout: config.timeout,
        }
    }

    pub fn gate(&self) -> &ConcurrencyGate {
        &self.gate
    }

    pub fn cache(&self) -> Option<&ResponseCache> {
        self.cache.as_ref()
    }

    /// Fetch `url` with `params`, decoding the body as `format`
    ///
    /// The API key, when configured, is added to `params` before the cache
    /// key is computed. A cache hit returns without touching the network.
    #[instrument(skip(self, params), fields(url = %url, format = ?format))]
    pub async fn fetch(
        &self,
        url: &str,
        mut params: QueryParams,
        format: ResponseFormat,
    ) -> Result<Payload> {
        for (name, value) in &self.api_params {
            params.insert(name.clone(), value.clone());
        }

        let key = cache_key(url, &params);
        if let Some(cache) = &self.cache {
            if let Some(raw) = cache.get(&key).await {
                match Payload::from_cache_value(&raw, format) {
                    Some(payload) => {
                        info!("Serving response from cache");
                        return Ok(payload);
                    }
                    None => warn!(key = %key, "Cached value has the wrong shape, refetching"),
                }
            }
        }

        let request_url = build_request_url(url, &params);
        let payload = with_retry(
            || self.attempt(&request_url, format),
            &self.retry_config,
            "NCBI API request",
        )
        .await?;

        if let Some(cache) = &self.cache {
            match payload.to_cache_value() {
                Ok(raw) => cache.set(&key, raw).await,
                Err(e) => warn!(error = %e, "Could not serialize response for cache"),
            }
        }

        Ok(payload)
    }

    /// Fetch a JSON document and decode it into `T`
    pub async fn fetch_json<T: DeserializeOwned>(&self, url: &str, params: QueryParams) -> Result<T> {
        let value = self
            .fetch(url, params, ResponseFormat::Json)
            .await?
            .into_json()?;
        Ok(serde_json::from_value(value)?)
    }

    /// Fetch a document as raw text
    pub async fn fetch_text(&self, url: &str, params: QueryParams) -> Result<String> {
        self.fetch(url, params, ResponseFormat::Text)
            .await?
            .into_text()
    }

    // One attempt; the permit is dropped on return, before any backoff sleep
    async fn attempt(&self, url: &str, format: ResponseFormat) -> Result<Payload> {
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| FetchError::GateClosed)?;

        debug!("Making API request to: {}", url);
        let response = self.http.get(url).timeout(self.timeout).send().await?;

        let status = response.status();
        if !status.is_success() {
            if !status.is_server_error() && status.as_u16() != 429 {
                warn!("API request failed with status: {}", status);
            }
            return Err(FetchError::ApiError {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Unknown error").to_string(),
            });
        }

        let body = response.text().await?;
        match format {
            ResponseFormat::Json => Ok(Payload::Json(serde_json::from_str(&body)?)),
            ResponseFormat::Text => Ok(Payload::Text(body)),
        }
    }
}

fn build_request_url(url: &str, params: &QueryParams) -> String {
    if params.is_empty() {
        return url.to_string();
    }

    let query: Vec<String> = params
        .iter()
        .map(|(name, value)| {
            format!(
                "{}={}",
                urlencoding::encode(name),
                urlencoding::encode(value)
            )
        })
        .collect();

    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}{}", url, separator, query.join("&"))
}
