use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Host prefix of every article link
pub const PUBMED_ARTICLE_BASE: &str = "https://pubmed.ncbi.nlm.nih.gov";

/// Lightweight article metadata returned by ESummary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleSummary {
    /// PubMed ID
    pub pmid: String,
    /// Article title
    pub title: String,
    /// Publication date as formatted upstream (e.g. "2020 Feb")
    pub pub_date: String,
    /// Journal name
    pub journal: String,
    /// Author display names, in order
    pub authors: Vec<String>,
}

/// Field values an [`Article`] is built from
///
/// Everything except the link; that one is always derived from the PMID.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleFields {
    pub pmid: String,
    pub title: String,
    pub pub_date: String,
    pub journal: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    #[serde(default)]
    pub mesh_terms: Vec<String>,
    #[serde(default)]
    pub doi: Option<String>,
    #[serde(default)]
    pub volume: Option<String>,
    #[serde(default)]
    pub issue: Option<String>,
    #[serde(default)]
    pub pages: Option<String>,
}

/// Full article record parsed from EFetch XML
///
/// Only constructible through [`Article::new`], which validates the PMID and
/// synthesizes the link. Deserializing goes through the same path, so a
/// `link` in the input is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ArticleFields")]
pub struct Article {
    pmid: String,
    pub title: String,
    pub pub_date: String,
    pub journal: String,
    pub authors: Vec<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    /// MeSH descriptor names, in document order
    pub mesh_terms: Vec<String>,
    pub doi: Option<String>,
    link: String,
    pub volume: Option<String>,
    pub issue: Option<String>,
    pub pages: Option<String>,
}

impl Article {
    /// Build an article, rejecting PMIDs that are not a non-empty run of ASCII digits
    ///
    /// # Example
    ///
    /// ```
    /// use pubmed_gateway::{Article, ArticleFields};
    ///
    /// let article = Article::new(ArticleFields {
    ///     pmid: "31978945".to_string(),
    ///     title: "A Novel Coronavirus".to_string(),
    ///     ..Default::default()
    /// })
    /// .unwrap();
    /// assert_eq!(article.link(), "https://pubmed.ncbi.nlm.nih.gov/31978945/");
    ///
    /// assert!(Article::new(ArticleFields { pmid: "abc".into(), ..Default::default() }).is_err());
    /// ```
    pub fn new(fields: ArticleFields) -> Result<Self, ParseError> {
        let pmid = fields.pmid.trim().to_string();
        if pmid.is_empty() || !pmid.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseError::InvalidPmid { pmid: fields.pmid });
        }

        let link = format!("{}/{}/", PUBMED_ARTICLE_BASE, pmid);
        Ok(Self {
            pmid,
            title: fields.title,
            pub_date: fields.pub_date,
            journal: fields.journal,
            authors: fields.authors,
            abstract_text: fields.abstract_text,
            mesh_terms: fields.mesh_terms,
            doi: fields.doi,
            link,
            volume: fields.volume,
            issue: fields.issue,
            pages: fields.pages,
        })
    }

    pub fn pmid(&self) -> &str {
        &self.pmid
    }

    /// Canonical PubMed page of the article
    pub fn link(&self) -> &str {
        &self.link
    }

    /// The summary-level view of this article
    pub fn summary(&self) -> ArticleSummary {
        ArticleSummary {
            pmid: self.pmid.clone(),
            title: self.title.clone(),
            pub_date: self.pub_date.clone(),
            journal: self.journal.clone(),
            authors: self.authors.clone(),
        }
    }
}

impl TryFrom<ArticleFields> for Article {
    type Error = ParseError;

    fn try_from(fields: ArticleFields) -> Result<Self, Self::Error> {
        Article::new(fields)
    }
}

/// Result of an ESpell lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpellCheckResult {
    pub original_query: String,
    pub corrected_query: Option<String>,
    /// True when a correction exists and differs from the query ignoring case
    pub has_correction: bool,
}

impl SpellCheckResult {
    pub fn new(original_query: impl Into<String>, corrected_query: Option<String>) -> Self {
        let original_query = original_query.into();
        let corrected_query = corrected_query.filter(|c| !c.is_empty());
        let has_correction = corrected_query
            .as_deref()
            .is_some_and(|c| c.to_lowercase() != original_query.to_lowercase());

        Self {
            original_query,
            corrected_query,
            has_correction,
        }
    }

    /// Result used when upstream could not be asked
    pub fn no_correction(original_query: impl Into<String>) -> Self {
        Self::new(original_query, None)
    }
}

/// An article paired with a similarity score
///
/// The score is a demonstration placeholder: it decreases with rank and is
/// not computed from article content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticSearchResult {
    /// In `[0, 1]`
    pub score: f64,
    pub article: Article,
}

impl SemanticSearchResult {
    /// `max(0.1, 0.95 - 0.05 * rank)`
    pub fn placeholder_score(rank: usize) -> f64 {
        (0.95 - 0.05 * rank as f64).max(0.1)
    }
}

/// AMA citation together with the article link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitationResult {
    pub citation: String,
    pub link: String,
}
