//! AMA-style citation formatting

use crate::pubmed::models::{Article, CitationResult};

/// Authors listed in full up to this count; longer lists are cut to three plus "et al"
const MAX_LISTED_AUTHORS: usize = 6;
const TRUNCATED_AUTHORS: usize = 3;

/// Format an article as `Authors. Title. *Journal*. Year;Volume(Issue):Pages.`
///
/// Empty parts are left out and the rest joined with single spaces, except
/// that the volume part follows the year's semicolon directly.
///
/// # Example
///
/// ```
/// use pubmed_gateway::{Article, ArticleFields};
/// use pubmed_gateway::pubmed::citation::format_ama_citation;
///
/// let article = Article::new(ArticleFields {
///     pmid: "1".into(),
///     title: "Foo".into(),
///     journal: "J".into(),
///     pub_date: "2020".into(),
///     authors: vec!["A".into(), "B".into()],
///     ..Default::default()
/// })
/// .unwrap();
///
/// assert_eq!(format_ama_citation(&article), "A, B Foo. *J*. 2020;");
/// ```
pub fn format_ama_citation(article: &Article) -> String {
    let authors = if article.authors.len() > MAX_LISTED_AUTHORS {
        format!("{}, et al", article.authors[..TRUNCATED_AUTHORS].join(", "))
    } else {
        article.authors.join(", ")
    };

    let title = format!(
        "{}.",
        article.title.replace('*', "").trim().trim_end_matches('.')
    );

    let journal = match article.journal.trim() {
        "" => String::new(),
        name => format!("*{}*.", name),
    };

    let mut year = if article.pub_date.is_empty() {
        String::new()
    } else {
        format!("{};", article.pub_date)
    };

    let present = |field: &Option<String>| field.clone().filter(|v| !v.is_empty());
    let mut details = String::new();
    if let Some(volume) = present(&article.volume) {
        details.push_str(&volume);
    }
    if let Some(issue) = present(&article.issue) {
        details.push_str(&format!("({})", issue));
    }
    if let Some(pages) = present(&article.pages) {
        details.push_str(&format!(":{}", pages));
    }
    if !details.is_empty() {
        details.push('.');
    }
    // `Year;Volume(Issue):Pages.` has no space after the semicolon
    if !year.is_empty() {
        year.push_str(&details);
        details.clear();
    }

    [authors, title, journal, year, details]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

impl Article {
    /// See [`format_ama_citation`]
    pub fn to_ama_citation(&self) -> String {
        format_ama_citation(self)
    }

    /// Citation string paired with the article link
    pub fn citation(&self) -> CitationResult {
        CitationResult {
            citation: self.to_ama_citation(),
            link: self.link().to_string(),
        }
    }
}
