use std::io::{self, Write};

use clap::Parser;
use search_engine::config::SearchCli;
use search_engine::search::{self, SearchEngine};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = SearchCli::parse();
    let preview_length = cli.preview_length;
    let cfg = cli.into_config();
    let engine = SearchEngine::load(cfg)?;
    tracing::info!(documents = engine.len(), "index loaded");

    let stdin = io::stdin();
    loop {
        print!("Query> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let query = line.trim();
        if query.is_empty() {
            break;
        }

        let hits = engine.search(query);
        if hits.is_empty() {
            println!("(no results)");
            continue;
        }
        for (rank, hit) in hits.iter().enumerate() {
            let keywords: Vec<&str> =
                hit.doc.theme_keywords.iter().take(10).map(String::as_str).collect();
            let snippet = search::preview_snippet(&hit.doc.text_preview, query, preview_length);
            println!("{}. {} ({})", rank + 1, hit.doc.title, hit.doc.url);
            println!("   language: {} | keywords: {}", hit.doc.language, keywords.join(", "));
            println!("   {snippet}");
            println!(
                "   score: combined={:.4} bm25_norm={:.4} index={:.4} pagerank={:.4} lang_x={:.2}",
                hit.trace.combined,
                hit.trace.bm25_norm,
                hit.trace.index_score,
                hit.trace.pagerank,
                hit.trace.lang_multiplier,
            );
        }
    }

    Ok(())
}
