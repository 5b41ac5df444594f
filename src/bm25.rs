//! Okapi BM25 over a fixed corpus of pre-tokenized documents.
//!
//! Used twice with different corpora: the indexer builds one over
//! `title + " " + text_content` for every scraped document (to drive theme
//! keyword extraction), and the search stage builds a second, narrower one
//! over each indexed document's surrogate string (title + keywords + url).

use std::collections::HashMap;

pub struct Bm25Model {
    doc_term_freq: Vec<HashMap<String, usize>>,
    doc_len: Vec<usize>,
    doc_freq: HashMap<String, usize>,
    avgdl: f64,
    n: usize,
    k1: f64,
    b: f64,
}

impl Bm25Model {
    pub fn new(token_lists: Vec<Vec<String>>, k1: f64, b: f64) -> Self {
        let n = token_lists.len();
        let mut doc_term_freq = Vec::with_capacity(n);
        let mut doc_len = Vec::with_capacity(n);
        let mut doc_freq: HashMap<String, usize> = HashMap::new();

        for tokens in &token_lists {
            let mut tf: HashMap<String, usize> = HashMap::new();
            for token in tokens {
                *tf.entry(token.clone()).or_insert(0) += 1;
            }
            doc_len.push(tokens.len());
            for term in tf.keys() {
                *doc_freq.entry(term.clone()).or_insert(0) += 1;
            }
            doc_term_freq.push(tf);
        }

        let avgdl = if n == 0 {
            0.0
        } else {
            doc_len.iter().sum::<usize>() as f64 / n as f64
        };

        Self { doc_term_freq, doc_len, doc_freq, avgdl, n, k1, b }
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Standard Robertson-Spärck Jones IDF. Flooring at zero for terms that
    /// occur in more than half the corpus is deliberately *not* done here;
    /// the formula is used as written, which can dip slightly negative for
    /// extremely common terms in a tiny corpus.
    pub fn idf(&self, term: &str) -> f64 {
        let df = *self.doc_freq.get(term).unwrap_or(&0) as f64;
        let n = self.n as f64;
        (((n - df + 0.5) / (df + 0.5)) + 1.0).ln()
    }

    pub fn term_frequency(&self, doc_index: usize, term: &str) -> usize {
        self.doc_term_freq
            .get(doc_index)
            .and_then(|tf| tf.get(term))
            .copied()
            .unwrap_or(0)
    }

    pub fn term_frequencies(&self, doc_index: usize) -> &HashMap<String, usize> {
        &self.doc_term_freq[doc_index]
    }

    /// BM25 score of `query` against document `doc_index`. Repeated query
    /// terms contribute their score again each time they appear, matching
    /// `rank_bm25.BM25Okapi.get_scores`, which loops over every token with
    /// no dedup.
    pub fn score(&self, query: &[String], doc_index: usize) -> f64 {
        if doc_index >= self.n || self.avgdl == 0.0 {
            return 0.0;
        }
        let doc_len = self.doc_len[doc_index] as f64;
        let mut total = 0.0;
        for term in query {
            let tf = self.term_frequency(doc_index, term) as f64;
            if tf == 0.0 {
                continue;
            }
            let idf = self.idf(term);
            let numerator = tf * (self.k1 + 1.0);
            let denominator = tf + self.k1 * (1.0 - self.b + self.b * doc_len / self.avgdl);
            total += idf * numerator / denominator;
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;

    #[test]
    fn ranks_relevant_document_higher() {
        let docs = vec![
            tokenize("carro rápido esportivo"),
            tokenize("fast sports car"),
            tokenize("banana"),
        ];
        let model = Bm25Model::new(docs, 1.5, 0.75);
        let query = tokenize("carro esportivo");

        let scores: Vec<f64> = (0..model.len()).map(|i| model.score(&query, i)).collect();
        assert!(scores[0] > scores[1]);
        assert!(scores[0] > scores[2]);
        assert_eq!(scores[2], 0.0);
    }

    #[test]
    fn empty_query_scores_zero() {
        let docs = vec![tokenize("hello world")];
        let model = Bm25Model::new(docs, 1.5, 0.75);
        assert_eq!(model.score(&[], 0), 0.0);
    }

    #[test]
    fn repeated_query_term_contributes_twice() {
        let docs = vec![tokenize("fast sports car"), tokenize("banana")];
        let model = Bm25Model::new(docs, 1.5, 0.75);
        let once = vec!["fast".to_string()];
        let twice = vec!["fast".to_string(), "fast".to_string()];
        assert_eq!(model.score(&twice, 0), model.score(&once, 0) * 2.0);
    }
}
