//! The indexer: link-graph construction, PageRank, heuristic quality
//! factors, a corpus-wide BM25 model, and per-document theme-keyword
//! extraction, composed into `index.ndjson`.

use indexmap::IndexMap;

use crate::bm25::Bm25Model;
use crate::config::IndexerConfig;
use crate::factors;
use crate::model::{IndexedDocument, ScrapedDocument};
use crate::ndjson;
use crate::pagerank::{self, LinkGraph};
use crate::stats::min_max_normalize;
use crate::tokenizer::tokenize;

/// Runs the full indexing pipeline and returns the number of documents
/// written to `index.ndjson`.
pub fn run(cfg: &IndexerConfig) -> anyhow::Result<usize> {
    let docs: Vec<ScrapedDocument> = ndjson::read_lines(&cfg.input_path)?;
    if docs.is_empty() {
        ndjson::Appender::create_new(&cfg.output_path)?;
        return Ok(0);
    }

    let mut url_index: IndexMap<String, usize> = IndexMap::new();
    for (ordinal, doc) in docs.iter().enumerate() {
        url_index.entry(doc.url.clone()).or_insert(ordinal);
    }

    let graph = LinkGraph::build(&docs, &url_index);
    let pagerank_raw = pagerank::compute(&graph, cfg.damping, cfg.pagerank_iterations);
    let pagerank_norm = min_max_normalize(&pagerank_raw);

    let token_lists: Vec<Vec<String>> = docs
        .iter()
        .map(|doc| tokenize(&format!("{} {}", doc.title, doc.text_content)))
        .collect();
    let bm25 = Bm25Model::new(token_lists, cfg.bm25_k1, cfg.bm25_b);

    let mut factors_raw = Vec::with_capacity(docs.len());
    let mut breakdowns = Vec::with_capacity(docs.len());
    for doc in &docs {
        let (raw, breakdown) = factors::compute_factors(doc, &cfg.factors);
        factors_raw.push(raw);
        breakdowns.push(breakdown);
    }
    let factors_norm = min_max_normalize(&factors_raw);

    let mut writer = ndjson::Appender::create_new(&cfg.output_path)?;
    let mut chunk: Vec<IndexedDocument> = Vec::with_capacity(cfg.save_chunk_size);
    let mut emitted = 0usize;

    for (i, doc) in docs.into_iter().enumerate() {
        if cfg.limit != 0 && emitted >= cfg.limit {
            break;
        }

        let keywords = theme_keywords(&bm25, i, cfg.bm25_top_terms);
        let final_score = clamp01(cfg.w_pr * pagerank_norm[i] + cfg.w_f * factors_norm[i]) * 100.0;
        let preview: String = doc.text_content.chars().take(cfg.text_preview_max_chars).collect();

        let indexed = IndexedDocument::from_scraped(doc).finish(
            pagerank_norm[i],
            factors_raw[i],
            factors_norm[i],
            final_score,
            keywords,
            breakdowns[i].clone(),
            preview,
        );

        chunk.push(indexed);
        emitted += 1;
        if chunk.len() >= cfg.save_chunk_size {
            writer.write_lines(&chunk)?;
            chunk.clear();
        }
    }
    if !chunk.is_empty() {
        writer.write_lines(&chunk)?;
    }

    tracing::info!(emitted, "indexer finished");
    Ok(emitted)
}

fn clamp01(v: f64) -> f64 {
    v.clamp(0.0, 1.0)
}

/// Theme-keyword extraction for document `doc_index`:
/// 1. Take the top 20 within-doc terms by raw frequency as candidate query Q.
/// 2. If `bm25.score(Q, doc_index) <= 0`, return the top `top_k` of Q as-is.
/// 3. Otherwise rescore each candidate with `tf * (1 + idf)` and return the
///    top `top_k` by that rescoring.
fn theme_keywords(bm25: &Bm25Model, doc_index: usize, top_k: usize) -> Vec<String> {
    let term_freq = bm25.term_frequencies(doc_index);
    let mut candidates: Vec<(&String, usize)> = term_freq.iter().map(|(term, freq)| (term, *freq)).collect();
    candidates.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    let top_20: Vec<String> = candidates.into_iter().take(20).map(|(term, _)| term.clone()).collect();

    if top_20.is_empty() {
        return Vec::new();
    }

    let base_score = bm25.score(&top_20, doc_index);
    if base_score <= 0.0 {
        return top_20.into_iter().take(top_k).collect();
    }

    let mut rescored: Vec<(String, f64)> = top_20
        .into_iter()
        .map(|term| {
            let tf = bm25.term_frequency(doc_index, &term) as f64;
            let idf = bm25.idf(&term);
            let weight = tf * (1.0 + idf);
            (term, weight)
        })
        .collect();
    rescored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal).then_with(|| a.0.cmp(&b.0)));
    rescored.into_iter().take(top_k).map(|(term, _)| term).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ndjson;

    fn doc(url: &str, title: &str, text: &str, links: &[&str]) -> ScrapedDocument {
        ScrapedDocument {
            url: url.to_string(),
            title: title.to_string(),
            text_content: text.to_string(),
            publish_date: None,
            language: "en".to_string(),
            links_found: links.iter().map(|s| s.to_string()).collect(),
            links_count: links.len(),
            scraped_at: "2024-01-01T00:00:00".to_string(),
        }
    }

    #[test]
    fn empty_scraped_yields_empty_index() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = IndexerConfig {
            input_path: dir.path().join("scraped.ndjson"),
            output_path: dir.path().join("index.ndjson"),
            ..IndexerConfig::default()
        };
        let emitted = run(&cfg).unwrap();
        assert_eq!(emitted, 0);
        let docs: Vec<IndexedDocument> = ndjson::read_lines(&cfg.output_path).unwrap();
        assert!(docs.is_empty());
    }

    #[test]
    fn final_scores_stay_within_bounds_and_urls_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let scraped_path = dir.path().join("scraped.ndjson");
        let docs = vec![
            doc("https://a.example", "A", "some content about rust programming", &["https://b.example"]),
            doc("https://b.example", "B", "other content entirely about cooking", &["https://a.example"]),
            doc("https://c.example", "C", "", &[]),
        ];
        ndjson::append_lines(&scraped_path, &docs).unwrap();

        let cfg = IndexerConfig {
            input_path: scraped_path,
            output_path: dir.path().join("index.ndjson"),
            ..IndexerConfig::default()
        };
        let emitted = run(&cfg).unwrap();
        assert_eq!(emitted, 3);

        let indexed: Vec<IndexedDocument> = ndjson::read_lines(&cfg.output_path).unwrap();
        let mut seen = std::collections::HashSet::new();
        for d in &indexed {
            assert!(d.final_score >= 0.0 && d.final_score <= 100.0);
            assert!(seen.insert(d.url.clone()), "duplicate url in index.ndjson");
        }
    }

    #[test]
    fn respects_limit() {
        let dir = tempfile::tempdir().unwrap();
        let scraped_path = dir.path().join("scraped.ndjson");
        let docs = vec![
            doc("https://a.example", "A", "content one", &[]),
            doc("https://b.example", "B", "content two", &[]),
            doc("https://c.example", "C", "content three", &[]),
        ];
        ndjson::append_lines(&scraped_path, &docs).unwrap();

        let cfg = IndexerConfig {
            input_path: scraped_path,
            output_path: dir.path().join("index.ndjson"),
            limit: 2,
            ..IndexerConfig::default()
        };
        let emitted = run(&cfg).unwrap();
        assert_eq!(emitted, 2);
    }
}
