//! Link-graph construction and the classical damped-random-surfer
//! PageRank iteration.

use indexmap::IndexMap;

use crate::model::ScrapedDocument;

/// Vertex set = indexed document ordinals. `out_edges[i]` lists the
/// distinct ordinals `i` links to, in first-seen order; parallel edges are
/// collapsed, self-loops are kept.
pub struct LinkGraph {
    out_edges: Vec<Vec<usize>>,
}

impl LinkGraph {
    pub fn build(docs: &[ScrapedDocument], url_index: &IndexMap<String, usize>) -> Self {
        let mut out_edges = Vec::with_capacity(docs.len());
        for doc in docs {
            let mut seen = std::collections::HashSet::new();
            let mut edges = Vec::new();
            for link in &doc.links_found {
                if let Some(&target) = url_index.get(link) {
                    if seen.insert(target) {
                        edges.push(target);
                    }
                }
            }
            out_edges.push(edges);
        }
        Self { out_edges }
    }

    pub fn len(&self) -> usize {
        self.out_edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.out_edges.is_empty()
    }

    pub fn out_degree(&self, i: usize) -> usize {
        self.out_edges[i].len()
    }
}

/// Runs `iterations` rounds of the damped random-surfer update, starting
/// from the uniform distribution. Dangling mass (nodes with no out-edges)
/// is not redistributed; it is silently lost each round, matching the
/// crawled source's behavior. There is no convergence check; the
/// iteration count is fixed by configuration.
pub fn compute(graph: &LinkGraph, damping: f64, iterations: usize) -> Vec<f64> {
    let n = graph.len();
    if n == 0 {
        return Vec::new();
    }
    let mut pr = vec![1.0 / n as f64; n];
    for _ in 0..iterations {
        let mut next = vec![(1.0 - damping) / n as f64; n];
        for (u, edges) in graph.out_edges.iter().enumerate() {
            if edges.is_empty() {
                continue;
            }
            let share = damping * pr[u] / edges.len() as f64;
            for &v in edges {
                next[v] += share;
            }
        }
        pr = next;
    }
    pr
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::min_max_normalize;

    fn doc(url: &str, links: &[&str]) -> ScrapedDocument {
        ScrapedDocument {
            url: url.to_string(),
            title: String::new(),
            text_content: String::new(),
            publish_date: None,
            language: "unknown".to_string(),
            links_found: links.iter().map(|s| s.to_string()).collect(),
            links_count: links.len(),
            scraped_at: String::new(),
        }
    }

    #[test]
    fn three_cycle_converges_to_uniform_then_normalizes_to_zero() {
        let docs = vec![
            doc("https://a.example", &["https://b.example"]),
            doc("https://b.example", &["https://c.example"]),
            doc("https://c.example", &["https://a.example"]),
        ];
        let mut url_index = IndexMap::new();
        for (i, d) in docs.iter().enumerate() {
            url_index.insert(d.url.clone(), i);
        }
        let graph = LinkGraph::build(&docs, &url_index);
        let raw = compute(&graph, 0.85, 50);
        for v in &raw {
            assert!((v - 1.0 / 3.0).abs() < 1e-6, "expected ~1/3, got {v}");
        }
        let normalized = min_max_normalize(&raw);
        assert_eq!(normalized, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn dangling_node_loses_mass() {
        let docs = vec![
            doc("https://a.example", &["https://b.example"]),
            doc("https://b.example", &[]),
        ];
        let mut url_index = IndexMap::new();
        for (i, d) in docs.iter().enumerate() {
            url_index.insert(d.url.clone(), i);
        }
        let graph = LinkGraph::build(&docs, &url_index);
        let raw = compute(&graph, 0.85, 25);
        let total: f64 = raw.iter().sum();
        assert!(total < 1.0 - 1e-6, "dangling mass should be lost, got sum {total}");
    }
}
