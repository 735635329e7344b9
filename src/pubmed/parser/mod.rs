//! EFetch XML to [`Article`] extraction
//!
//! Every field is looked up as "first matching descendant" of the
//! `PubmedArticle` node and every field may be missing.

mod tree;

pub use tree::{XmlElement, parse_document};

use tracing::debug;

use crate::error::ParseError;
use crate::pubmed::models::{Article, ArticleFields};

pub const NO_TITLE: &str = "No Title Found";
pub const NOT_AVAILABLE: &str = "N/A";
pub const NO_ABSTRACT: &str = "Abstract not available.";

/// Parse an EFetch document and extract the first article in it
///
/// Returns `Ok(None)` when the document holds no `PubmedArticle`. The link
/// and PMID of the result come from `pmid`, not from the document.
pub fn parse_article(xml: &str, pmid: &str) -> Result<Option<Article>, ParseError> {
    let root = parse_document(xml)?;

    // The document element is never its own descendant, so a bare
    // <PubmedArticle> root yields no article
    let Some(node) = root.find(".//PubmedArticle") else {
        debug!(pmid = %pmid, "No PubmedArticle node in document");
        return Ok(None);
    };

    Article::new(extract_fields(node, pmid)).map(Some)
}

fn extract_fields(node: &XmlElement, pmid: &str) -> ArticleFields {
    let title = node
        .find(".//ArticleTitle")
        .map(|t| t.itertext().trim().to_string())
        .unwrap_or_else(|| NO_TITLE.to_string());

    let authors = node
        .findall(".//AuthorList/Author")
        .into_iter()
        .map(|author| {
            format!(
                "{} {}",
                author.findtext("LastName").unwrap_or(""),
                author.findtext("Initials").unwrap_or("")
            )
            .trim()
            .to_string()
        })
        .collect();

    let optional = |path: &str| node.findtext(path).map(str::to_string);

    let mesh_terms = node
        .findall(".//MeshHeadingList/MeshHeading/DescriptorName")
        .into_iter()
        .filter_map(|term| term.text())
        .filter(|text| !text.is_empty())
        .map(str::to_string)
        .collect();

    let doi = node
        .find(".//ArticleIdList/ArticleId[@IdType='doi']")
        .and_then(|id| id.text())
        .map(str::to_string);

    ArticleFields {
        pmid: pmid.to_string(),
        title,
        pub_date: node
            .findtext(".//PubDate/Year")
            .unwrap_or(NOT_AVAILABLE)
            .to_string(),
        journal: node
            .findtext(".//Journal/Title")
            .unwrap_or(NOT_AVAILABLE)
            .to_string(),
        authors,
        abstract_text: extract_abstract(node),
        mesh_terms,
        doi,
        volume: optional(".//Journal/JournalIssue/Volume"),
        issue: optional(".//Journal/JournalIssue/Issue"),
        pages: optional(".//Pagination/MedlinePgn"),
    }
}

fn extract_abstract(node: &XmlElement) -> String {
    let sections: Vec<String> = node
        .findall(".//Abstract/AbstractText")
        .into_iter()
        .filter_map(|section| {
            let text = section.itertext().trim().to_string();
            if text.is_empty() {
                return None;
            }
            match section.attribute("Label").filter(|label| !label.is_empty()) {
                Some(label) => Some(format!("**{}:** {}", label.trim(), text)),
                None => Some(text),
            }
        })
        .collect();

    if sections.is_empty() {
        NO_ABSTRACT.to_string()
    } else {
        sections.join("\n\n")
    }
}
