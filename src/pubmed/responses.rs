use std::collections::HashMap;

use serde::Deserialize;

// ESearch API response structures
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ESearchResult {
    #[serde(default)]
    pub esearchresult: ESearchData,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ESearchData {
    #[serde(default, rename = "ERROR")]
    pub error: Option<String>,
    #[serde(default)]
    pub count: Option<String>,
    #[serde(default)]
    pub idlist: Vec<String>,
}

// ESpell API response structures
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ESpellResponse {
    #[serde(default, rename = "es-result")]
    pub result: ESpellResult,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ESpellResult {
    #[serde(default)]
    pub corrected: Option<String>,
}

// ESummary API response structures

/// ESummary nests one object per uid next to the `uids` list, so the
/// documents are collected through a flattened map and decoded one by one.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ESummaryResponse {
    #[serde(default)]
    pub result: Option<ESummaryResult>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ESummaryResult {
    #[serde(default)]
    pub uids: Vec<String>,
    #[serde(flatten)]
    pub documents: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ESummaryAuthor {
    #[serde(default)]
    pub name: String,
}

/// A single document summary; `uid` is mandatory, a `null` in any string
/// field fails decoding so the record gets skipped.
#[derive(Debug, Deserialize)]
pub(crate) struct ESummaryDocSum {
    pub uid: String,
    #[serde(default = "default_summary_title")]
    pub title: String,
    #[serde(default)]
    pub pubdate: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub authors: Vec<ESummaryAuthor>,
    /// Set by upstream instead of the fields above for unknown uids
    #[serde(default)]
    pub error: Option<String>,
}

fn default_summary_title() -> String {
    "No Title".to_string()
}

// ELink API response structures
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ELinkResponse {
    #[serde(default)]
    pub linksets: Vec<ELinkSet>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ELinkSet {
    #[serde(default)]
    pub webenv: Option<String>,
    #[serde(default, rename = "linksetdbs", alias = "linksetdbhistories")]
    pub linkset_dbs: Vec<ELinkSetDb>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ELinkSetDb {
    #[serde(default, rename = "querykey")]
    pub query_key: Option<QueryKey>,
}

/// Upstream has sent the history query key both as a string and as a number
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub(crate) enum QueryKey {
    Text(String),
    Number(u64),
}

impl QueryKey {
    pub fn into_param(self) -> String {
        match self {
            QueryKey::Text(text) => text,
            QueryKey::Number(n) => n.to_string(),
        }
    }
}

/// Server-side result set established by ELink phase one
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RelatedSet {
    pub web_env: String,
    pub query_key: String,
}

impl ELinkResponse {
    /// Session token and query handle of the first linkset, if both are present
    pub fn related_set(self) -> Option<RelatedSet> {
        let linkset = self.linksets.into_iter().next()?;
        let web_env = linkset.webenv.filter(|w| !w.is_empty())?;
        let query_key = linkset
            .linkset_dbs
            .into_iter()
            .next()?
            .query_key?
            .into_param();
        Some(RelatedSet { web_env, query_key })
    }
}
