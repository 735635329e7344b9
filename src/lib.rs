//! # PubMed Gateway
//!
//! A caching, rate-aware gateway in front of the NCBI E-utilities PubMed
//! search service. It turns simple search requests into the upstream
//! multi-step protocol (search, then summarize or fetch, then parse) and
//! returns clean, strongly typed records.
//!
//! ## Features
//!
//! - **Resilient requests**: exponential backoff on 429/5xx/transport errors,
//!   a concurrency gate sized by whether an API key is configured
//! - **Response caching**: raw upstream payloads keyed by a SHA-256
//!   fingerprint of URL and parameters; in-memory by default, Redis with the
//!   `cache-redis` feature
//! - **Article parsing**: EFetch XML to [`Article`], with AMA citations
//! - **No faults at the boundary**: operations return empty values, or an
//!   [`Outcome`] from the `try_*` variants when the cause matters
//!
//! ## Quick Start
//!
//! ```no_run
//! use pubmed_gateway::{ClientConfig, LiteratureService, PubMedClient, SearchRequest};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = PubMedClient::with_config(ClientConfig::from_env());
//!     let service = LiteratureService::new(client);
//!
//!     let request = SearchRequest::new("asthma").with_field("[TI]").with_max_results(5);
//!     for citation in service.search_citations(&request).await {
//!         println!("{} {}", citation.citation, citation.link);
//!     }
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod pubmed;
pub mod rate_limit;
pub mod retry;
pub mod service;

// Re-export main types for convenience
pub use cache::{CacheBackendConfig, CacheConfig, ResponseCache, cache_key, create_cache};
pub use config::ClientConfig;
pub use error::{FailureKind, FetchError, Outcome, ParseError, Result};
pub use fetcher::{Payload, ResilientFetcher, ResponseFormat};
pub use pubmed::{
    Article, ArticleFields, ArticleSummary, CitationResult, PubMedClient, SemanticSearchResult,
    SpellCheckResult, format_ama_citation,
};
pub use rate_limit::ConcurrencyGate;
pub use retry::RetryConfig;
pub use service::{LiteratureService, SearchRequest};
