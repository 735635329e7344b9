//! PubMed gateway: E-utilities operations, response decoding, article parsing
//! and citation formatting.

pub mod citation;
pub mod client;
pub mod models;
pub mod parser;
pub(crate) mod responses;

pub use citation::format_ama_citation;
pub use client::{PubMedClient, build_search_term};
pub use models::{
    Article, ArticleFields, ArticleSummary, CitationResult, SemanticSearchResult,
    SpellCheckResult,
};
pub use parser::parse_article;
