//! Wire types shared by all three pipeline stages.
//!
//! These are the only structures that cross a process boundary: the crawler
//! writes [`ScrapedDocument`] and [`VisitedRecord`] lines, the indexer reads
//! the former and writes [`IndexedDocument`] lines, and the search stage
//! reads the latter.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One crawled page, as written to `scraped.ndjson`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScrapedDocument {
    pub url: String,
    pub title: String,
    pub text_content: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub publish_date: Option<String>,
    pub language: String,
    pub links_found: Vec<String>,
    pub links_count: usize,
    pub scraped_at: String,
}

/// One line of `visited.ndjson`, the resume log.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VisitedRecord {
    pub url: String,
}

/// Audit entry for one heuristic quality factor, emitted inside
/// `factors_breakdown`. `details` carries whatever diagnostic fields are
/// specific to the factor (bounds, matched substrings, hit counts, ...).
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct FactorDetail {
    pub score: f64,
    pub enabled: bool,
    #[serde(flatten)]
    pub details: Value,
}

pub type FactorsBreakdown = IndexMap<String, FactorDetail>;

/// One ranked document, as written to `index.ndjson`. A superset of
/// [`ScrapedDocument`] with the indexer's derived scoring fields appended.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IndexedDocument {
    pub url: String,
    pub title: String,
    pub text_content: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub publish_date: Option<String>,
    pub language: String,
    pub links_found: Vec<String>,
    pub links_count: usize,
    pub scraped_at: String,
    pub pagerank: f64,
    pub factors_raw: f64,
    pub factors_norm: f64,
    pub final_score: f64,
    pub theme_keywords: Vec<String>,
    pub factors_breakdown: FactorsBreakdown,
    pub text_preview: String,
}

impl IndexedDocument {
    pub fn from_scraped(doc: ScrapedDocument) -> IndexedDocumentBuilder {
        IndexedDocumentBuilder { doc }
    }
}

/// Small builder so the indexer doesn't have to restate every
/// passed-through field when it assembles the derived ones.
pub struct IndexedDocumentBuilder {
    doc: ScrapedDocument,
}

impl IndexedDocumentBuilder {
    #[allow(clippy::too_many_arguments)]
    pub fn finish(
        self,
        pagerank: f64,
        factors_raw: f64,
        factors_norm: f64,
        final_score: f64,
        theme_keywords: Vec<String>,
        factors_breakdown: FactorsBreakdown,
        text_preview: String,
    ) -> IndexedDocument {
        IndexedDocument {
            url: self.doc.url,
            title: self.doc.title,
            text_content: self.doc.text_content,
            publish_date: self.doc.publish_date,
            language: self.doc.language,
            links_found: self.doc.links_found,
            links_count: self.doc.links_count,
            scraped_at: self.doc.scraped_at,
            pagerank,
            factors_raw,
            factors_norm,
            final_score,
            theme_keywords,
            factors_breakdown,
            text_preview,
        }
    }
}
