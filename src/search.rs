//! The query processor: loads `index.ndjson`, builds a narrow surrogate
//! BM25 model over each document's title/keywords/url, and fuses BM25 with
//! the indexer's precomputed PageRank and quality scores at query time.

use crate::bm25::Bm25Model;
use crate::config::SearchConfig;
use crate::model::IndexedDocument;
use crate::ndjson;
use crate::stats::min_max_normalize;
use crate::tokenizer::tokenize;

/// Per-component breakdown of how a hit's `combined` score was reached,
/// surfaced by the `search` binary's REPL as a score trace.
#[derive(Clone, Debug)]
pub struct ScoreTrace {
    pub bm25_raw: f64,
    pub bm25_norm: f64,
    pub index_score: f64,
    pub pagerank: f64,
    pub lang_multiplier: f64,
    pub combined: f64,
}

#[derive(Clone, Debug)]
pub struct SearchHit {
    pub doc: IndexedDocument,
    pub trace: ScoreTrace,
}

pub struct SearchEngine {
    docs: Vec<IndexedDocument>,
    surrogate_model: Bm25Model,
    cfg: SearchConfig,
}

impl SearchEngine {
    pub fn load(cfg: SearchConfig) -> anyhow::Result<Self> {
        let docs: Vec<IndexedDocument> = ndjson::read_lines(&cfg.index_path)?;
        let token_lists: Vec<Vec<String>> = docs.iter().map(|doc| tokenize(&surrogate(doc, &cfg))).collect();
        let surrogate_model = Bm25Model::new(token_lists, cfg.bm25_k1, cfg.bm25_b);
        Ok(Self { docs, surrogate_model, cfg })
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Ranks every document against `query`, fusing BM25, the indexer's
    /// normalized score, and PageRank, then applies the language-priority
    /// multiplier and sorts (descending by default).
    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        let tokens = tokenize(query);
        if tokens.is_empty() || self.docs.is_empty() {
            return Vec::new();
        }

        let bm25_raw: Vec<f64> =
            (0..self.docs.len()).map(|i| self.surrogate_model.score(&tokens, i)).collect();
        let bm25_norm = min_max_normalize(&bm25_raw);

        let mut hits: Vec<SearchHit> = self
            .docs
            .iter()
            .enumerate()
            .map(|(i, doc)| {
                let bm = bm25_norm[i];
                let idx = (doc.final_score / 100.0).clamp(0.0, 1.0);
                let pr = doc.pagerank.clamp(0.0, 1.0);
                let combined = self.cfg.w_bm * bm + self.cfg.w_idx * idx + self.cfg.w_pr * pr;
                let lang_multiplier = language_multiplier(&doc.language, &self.cfg);
                let combined = combined * lang_multiplier;
                SearchHit {
                    doc: doc.clone(),
                    trace: ScoreTrace {
                        bm25_raw: bm25_raw[i],
                        bm25_norm: bm,
                        index_score: idx,
                        pagerank: pr,
                        lang_multiplier,
                        combined,
                    },
                }
            })
            .collect();

        if self.cfg.ascending {
            hits.sort_by(|a, b| {
                a.trace.combined.partial_cmp(&b.trace.combined).unwrap_or(std::cmp::Ordering::Equal)
            });
        } else {
            hits.sort_by(|a, b| {
                b.trace.combined.partial_cmp(&a.trace.combined).unwrap_or(std::cmp::Ordering::Equal)
            });
        }
        hits.truncate(self.cfg.results_limit);
        hits
    }
}

fn surrogate(doc: &IndexedDocument, cfg: &SearchConfig) -> String {
    let mut parts = vec![doc.title.clone()];
    if cfg.include_keywords_in_surrogate {
        parts.push(doc.theme_keywords.join(" "));
    }
    if cfg.include_url_in_surrogate {
        parts.push(doc.url.clone());
    }
    parts.join(" ")
}

/// No priority list configured → neutral multiplier. Otherwise an earlier
/// position in `lang_priority` earns a small boost (`1 + 0.08/(1+i)`); a
/// document whose language isn't in the list at all is penalized by
/// `lang_penalty_multiplier`.
fn language_multiplier(language: &str, cfg: &SearchConfig) -> f64 {
    if cfg.lang_priority.is_empty() {
        return 1.0;
    }
    match cfg.lang_priority.iter().position(|entry| language == entry || language.starts_with(entry.as_str())) {
        Some(i) => 1.0 + 0.08 / (1.0 + i as f64),
        None => cfg.lang_penalty_multiplier,
    }
}

/// Sliding-window preview snippet: scans `text_preview` in windows of
/// `window_len` (stepping by `max(40, window_len / 4)`), scoring each
/// window by the number of *distinct* query tokens it contains as a
/// substring, and stops early once `min(|tokens|, 6)` distinct tokens have
/// been matched by the best window seen so far. The winning window is
/// prefixed/suffixed with an ellipsis wherever it doesn't already start or
/// end the source text.
pub fn preview_snippet(text_preview: &str, query: &str, window_len: usize) -> String {
    let chars: Vec<char> = text_preview.chars().collect();
    if chars.is_empty() {
        return String::new();
    }
    let tokens: indexmap::IndexSet<String> = tokenize(query).into_iter().collect();
    if tokens.is_empty() || window_len == 0 {
        return chars.iter().take(window_len.max(1)).collect();
    }

    let target_hits = tokens.len().min(6);
    let step = (window_len / 4).max(40);
    let lower: String = chars.iter().collect::<String>().to_lowercase();
    let lower_chars: Vec<char> = lower.chars().collect();

    let mut best_start = 0usize;
    let mut best_score = 0usize;
    let mut start = 0usize;
    while start < chars.len() {
        let end = (start + window_len).min(chars.len());
        let window: String = lower_chars[start..end].iter().collect();
        let score = tokens.iter().filter(|tok| window.contains(tok.as_str())).count();
        if score > best_score {
            best_score = score;
            best_start = start;
        }
        if best_score >= target_hits {
            break;
        }
        if end == chars.len() {
            break;
        }
        start += step;
    }

    let end = (best_start + window_len).min(chars.len());
    let mut snippet: String = chars[best_start..end].iter().collect();
    if end < chars.len() {
        snippet.push('…');
    }
    if best_start > 0 {
        snippet = format!("…{snippet}");
    }
    snippet
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FactorDetail, FactorsBreakdown};

    fn doc(url: &str, title: &str, pagerank: f64, final_score: f64, language: &str, keywords: &[&str]) -> IndexedDocument {
        IndexedDocument {
            url: url.to_string(),
            title: title.to_string(),
            text_content: String::new(),
            publish_date: None,
            language: language.to_string(),
            links_found: Vec::new(),
            links_count: 0,
            scraped_at: String::new(),
            pagerank,
            factors_raw: 0.0,
            factors_norm: 0.0,
            final_score,
            theme_keywords: keywords.iter().map(|s| s.to_string()).collect(),
            factors_breakdown: FactorsBreakdown::new(),
            text_preview: "some preview text about rust programming and search engines".to_string(),
        }
    }

    fn write_index(path: &std::path::Path, docs: &[IndexedDocument]) {
        ndjson::append_lines(path, docs).unwrap();
    }

    #[test]
    fn empty_query_returns_no_hits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.ndjson");
        write_index(&path, &[doc("https://a.example", "A", 0.5, 50.0, "en", &["rust"])]);
        let cfg = SearchConfig { index_path: path, ..SearchConfig::default() };
        let engine = SearchEngine::load(cfg).unwrap();
        assert!(engine.search("   ").is_empty());
    }

    #[test]
    fn empty_index_returns_no_hits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.ndjson");
        let cfg = SearchConfig { index_path: path, ..SearchConfig::default() };
        let engine = SearchEngine::load(cfg).unwrap();
        assert!(engine.search("rust").is_empty());
    }

    #[test]
    fn ranks_relevant_document_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.ndjson");
        write_index(
            &path,
            &[
                doc("https://a.example", "Rust Programming Guide", 0.2, 40.0, "en", &["rust", "programming"]),
                doc("https://b.example", "Cooking Recipes", 0.9, 90.0, "en", &["cooking", "recipes"]),
            ],
        );
        let cfg = SearchConfig { index_path: path, ..SearchConfig::default() };
        let engine = SearchEngine::load(cfg).unwrap();
        let hits = engine.search("rust programming");
        assert_eq!(hits[0].doc.url, "https://a.example");
    }

    #[test]
    fn lang_priority_boosts_matching_and_penalizes_others() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.ndjson");
        write_index(
            &path,
            &[
                doc("https://a.example", "Rust Guide", 0.5, 50.0, "pt", &["rust"]),
                doc("https://b.example", "Rust Guide", 0.5, 50.0, "en", &["rust"]),
            ],
        );
        let cfg = SearchConfig {
            index_path: path,
            lang_priority: vec!["pt".to_string()],
            ..SearchConfig::default()
        };
        let engine = SearchEngine::load(cfg).unwrap();
        let hits = engine.search("rust");
        assert_eq!(hits[0].doc.language, "pt");
        assert!(hits[0].trace.lang_multiplier > hits[1].trace.lang_multiplier);
    }

    #[test]
    fn lang_priority_prefix_matches_regional_variants() {
        let cfg = SearchConfig { lang_priority: vec!["pt".to_string()], ..SearchConfig::default() };
        assert!(language_multiplier("pt-BR", &cfg) > 1.0);
        assert_eq!(language_multiplier("en", &cfg), cfg.lang_penalty_multiplier);
    }

    #[test]
    fn preview_snippet_contains_query_terms_and_is_bounded() {
        let text = "some preview text about rust programming and search engines";
        let snippet = preview_snippet(text, "rust programming", 30);
        assert!(snippet.to_lowercase().contains("rust"));
        assert!(snippet.chars().count() <= 32);
    }

    #[test]
    fn preview_snippet_of_empty_text_is_empty() {
        assert_eq!(preview_snippet("", "rust", 30), "");
    }

    #[test]
    fn preview_snippet_counts_repeated_query_token_once() {
        let text = "some preview text about rust programming and search engines";
        let with_repeat = preview_snippet(text, "rust rust complex", 30);
        let without_repeat = preview_snippet(text, "rust complex", 30);
        assert_eq!(with_repeat, without_repeat);
    }
}
