//! Per-stage configuration records and their `clap` CLI wrappers. Each
//! stage is driven from a single typed record built at the entry point,
//! no environment variables, no persisted settings (per the external
//! interface contract).

use std::path::PathBuf;

use clap::Parser;

use crate::factors::FactorsConfig;

#[derive(Clone, Debug)]
pub struct CrawlerConfig {
    pub user_agent: String,
    pub max_total_urls: usize,
    pub max_global_workers: usize,
    pub save_chunk_size: usize,
    pub max_concurrent_per_host: usize,
    pub delay_between_requests: f64,
    pub request_timeout: u64,
    pub max_retries: u32,
    pub retry_backoff: u64,
    pub respect_robots: bool,
    pub visited_path: PathBuf,
    pub scraped_path: PathBuf,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (compatible; CustomCrawler/1.0)".to_string(),
            max_total_urls: 1000,
            max_global_workers: 50,
            save_chunk_size: 20,
            max_concurrent_per_host: 2,
            delay_between_requests: 1.0,
            request_timeout: 15,
            max_retries: 3,
            retry_backoff: 2,
            respect_robots: true,
            visited_path: PathBuf::from("visited.ndjson"),
            scraped_path: PathBuf::from("scraped.ndjson"),
        }
    }
}

/// `crawl` binary CLI surface.
#[derive(Parser, Debug)]
#[command(author, version, about = "Polite asynchronous seed crawler", long_about = None)]
pub struct CrawlCli {
    /// One or more seed URLs to start crawling from.
    #[arg(required = true)]
    pub seeds: Vec<String>,

    #[arg(long, default_value_t = 1000)]
    pub max_total_urls: usize,

    #[arg(long, default_value_t = 50)]
    pub max_global_workers: usize,

    #[arg(long, default_value_t = 20)]
    pub save_chunk_size: usize,

    #[arg(long, default_value_t = 2)]
    pub max_concurrent_per_host: usize,

    #[arg(long, default_value_t = 1.0)]
    pub delay_between_requests: f64,

    #[arg(long, default_value_t = 15)]
    pub request_timeout: u64,

    #[arg(long, default_value_t = 3)]
    pub max_retries: u32,

    #[arg(long, default_value_t = 2)]
    pub retry_backoff: u64,

    #[arg(long, action = clap::ArgAction::Set, default_value_t = true)]
    pub respect_robots: bool,

    #[arg(long, default_value = "visited.ndjson")]
    pub visited_path: PathBuf,

    #[arg(long, default_value = "scraped.ndjson")]
    pub scraped_path: PathBuf,
}

impl CrawlCli {
    pub fn into_config(self) -> (Vec<String>, CrawlerConfig) {
        let cfg = CrawlerConfig {
            user_agent: CrawlerConfig::default().user_agent,
            max_total_urls: self.max_total_urls,
            max_global_workers: self.max_global_workers,
            save_chunk_size: self.save_chunk_size,
            max_concurrent_per_host: self.max_concurrent_per_host,
            delay_between_requests: self.delay_between_requests,
            request_timeout: self.request_timeout,
            max_retries: self.max_retries,
            retry_backoff: self.retry_backoff,
            respect_robots: self.respect_robots,
            visited_path: self.visited_path,
            scraped_path: self.scraped_path,
        };
        (self.seeds, cfg)
    }
}

#[derive(Clone, Debug)]
pub struct IndexerConfig {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub damping: f64,
    pub pagerank_iterations: usize,
    pub w_pr: f64,
    pub w_f: f64,
    pub bm25_k1: f64,
    pub bm25_b: f64,
    pub bm25_top_terms: usize,
    pub save_chunk_size: usize,
    pub limit: usize,
    pub text_preview_max_chars: usize,
    pub factors: FactorsConfig,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("scraped.ndjson"),
            output_path: PathBuf::from("index.ndjson"),
            damping: 0.85,
            pagerank_iterations: 25,
            w_pr: 0.45,
            w_f: 0.55,
            bm25_k1: 1.5,
            bm25_b: 0.75,
            bm25_top_terms: 10,
            save_chunk_size: 50,
            limit: 0,
            text_preview_max_chars: 200,
            factors: FactorsConfig::default(),
        }
    }
}

/// `index` binary CLI surface.
#[derive(Parser, Debug)]
#[command(author, version, about = "Offline link-graph and BM25 indexer", long_about = None)]
pub struct IndexCli {
    #[arg(long, default_value = "scraped.ndjson")]
    pub input_path: PathBuf,

    #[arg(long, default_value = "index.ndjson")]
    pub output_path: PathBuf,

    #[arg(long, default_value_t = 0.85)]
    pub damping: f64,

    #[arg(long, default_value_t = 25)]
    pub pagerank_iterations: usize,

    #[arg(long, default_value_t = 0.45)]
    pub w_pr: f64,

    #[arg(long, default_value_t = 0.55)]
    pub w_f: f64,

    #[arg(long, default_value_t = 10)]
    pub bm25_top_terms: usize,

    #[arg(long, default_value_t = 50)]
    pub save_chunk_size: usize,

    /// 0 means unlimited.
    #[arg(long, default_value_t = 0)]
    pub limit: usize,

    #[arg(long, default_value_t = 200)]
    pub text_preview_max_chars: usize,
}

impl IndexCli {
    pub fn into_config(self) -> IndexerConfig {
        IndexerConfig {
            input_path: self.input_path,
            output_path: self.output_path,
            damping: self.damping,
            pagerank_iterations: self.pagerank_iterations,
            w_pr: self.w_pr,
            w_f: self.w_f,
            bm25_top_terms: self.bm25_top_terms,
            save_chunk_size: self.save_chunk_size,
            limit: self.limit,
            text_preview_max_chars: self.text_preview_max_chars,
            ..IndexerConfig::default()
        }
    }
}

#[derive(Clone, Debug)]
pub struct SearchConfig {
    pub index_path: PathBuf,
    pub bm25_k1: f64,
    pub bm25_b: f64,
    pub include_keywords_in_surrogate: bool,
    pub include_url_in_surrogate: bool,
    pub w_bm: f64,
    pub w_idx: f64,
    pub w_pr: f64,
    pub lang_priority: Vec<String>,
    pub lang_penalty_multiplier: f64,
    pub results_limit: usize,
    pub preview_length: usize,
    pub ascending: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            index_path: PathBuf::from("index.ndjson"),
            bm25_k1: 1.5,
            bm25_b: 0.75,
            include_keywords_in_surrogate: true,
            include_url_in_surrogate: true,
            w_bm: 0.5,
            w_idx: 0.3,
            w_pr: 0.2,
            lang_priority: Vec::new(),
            lang_penalty_multiplier: 0.85,
            results_limit: 10,
            preview_length: 160,
            ascending: false,
        }
    }
}

/// `search` binary CLI surface.
#[derive(Parser, Debug)]
#[command(author, version, about = "Interactive query processor over an index.ndjson", long_about = None)]
pub struct SearchCli {
    #[arg(long, default_value = "index.ndjson")]
    pub index_path: PathBuf,

    /// Ordered language preference, e.g. `--lang-priority pt --lang-priority en`.
    #[arg(long)]
    pub lang_priority: Vec<String>,

    #[arg(long, default_value_t = 0.85)]
    pub lang_penalty_multiplier: f64,

    #[arg(long, default_value_t = 10)]
    pub results_limit: usize,

    #[arg(long, default_value_t = 160)]
    pub preview_length: usize,

    #[arg(long, default_value_t = false)]
    pub ascending: bool,
}

impl SearchCli {
    pub fn into_config(self) -> SearchConfig {
        SearchConfig {
            index_path: self.index_path,
            lang_priority: self.lang_priority,
            lang_penalty_multiplier: self.lang_penalty_multiplier,
            results_limit: self.results_limit,
            preview_length: self.preview_length,
            ascending: self.ascending,
            ..SearchConfig::default()
        }
    }
}
