//! The crawler driver: a bounded-quota, politeness-respecting worker pool
//! that harvests a same-host link closure from a set of seeds.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tokio::sync::{Mutex, Notify};
use tokio::time::sleep;

use crate::admission::HostAdmission;
use crate::config::CrawlerConfig;
use crate::error::FetchError;
use crate::model::{ScrapedDocument, VisitedRecord};
use crate::ndjson;
use crate::parser;
use crate::robots::RobotsCache;

/// FIFO work queue with a bounded wait: a dequeue blocks until an item
/// arrives or 5 seconds elapse, per the worker's sole mechanism for
/// noticing steady-state emptiness.
struct WorkQueue {
    items: Mutex<VecDeque<String>>,
    notify: Notify,
}

impl WorkQueue {
    fn new() -> Self {
        Self { items: Mutex::new(VecDeque::new()), notify: Notify::new() }
    }

    async fn enqueue(&self, url: String) {
        let mut items = self.items.lock().await;
        items.push_back(url);
        drop(items);
        self.notify.notify_one();
    }

    async fn dequeue(&self) -> Option<String> {
        loop {
            {
                let mut items = self.items.lock().await;
                if let Some(url) = items.pop_front() {
                    return Some(url);
                }
            }
            match tokio::time::timeout(Duration::from_secs(5), self.notify.notified()).await {
                Ok(()) => continue,
                Err(_) => return None,
            }
        }
    }

    async fn drain(&self) {
        self.items.lock().await.clear();
    }
}

/// Visited-set membership check and visited-log append happen under one
/// lock window, so "already dispatched" can never race with "about to
/// dispatch".
struct VisitedStore {
    seen: Mutex<HashSet<String>>,
    path: std::path::PathBuf,
}

impl VisitedStore {
    fn new(path: std::path::PathBuf) -> Self {
        Self { seen: Mutex::new(HashSet::new()), path }
    }

    async fn load_resume_log(&self) -> anyhow::Result<usize> {
        let records: Vec<VisitedRecord> = ndjson::read_lines(&self.path)?;
        let mut seen = self.seen.lock().await;
        for record in &records {
            seen.insert(record.url.clone());
        }
        Ok(seen.len())
    }

    async fn contains(&self, url: &str) -> bool {
        self.seen.lock().await.contains(url)
    }

    /// Returns `true` if `url` was newly inserted (i.e. this caller is the
    /// one that should dispatch it).
    async fn check_and_insert(&self, url: &str) -> anyhow::Result<bool> {
        let mut seen = self.seen.lock().await;
        if seen.contains(url) {
            return Ok(false);
        }
        seen.insert(url.to_string());
        ndjson::append_line(&self.path, &VisitedRecord { url: url.to_string() })?;
        Ok(true)
    }
}

/// Scraped-document write buffer; flushed to disk once it reaches
/// `chunk_size`, and force-flushed once at shutdown.
struct ScrapedBuffer {
    items: Mutex<Vec<ScrapedDocument>>,
    path: std::path::PathBuf,
    chunk_size: usize,
}

impl ScrapedBuffer {
    fn new(path: std::path::PathBuf, chunk_size: usize) -> Self {
        Self { items: Mutex::new(Vec::new()), path, chunk_size }
    }

    async fn push_and_maybe_flush(&self, doc: ScrapedDocument) -> anyhow::Result<()> {
        let mut items = self.items.lock().await;
        items.push(doc);
        if items.len() >= self.chunk_size {
            ndjson::append_lines(&self.path, &items)?;
            items.clear();
        }
        Ok(())
    }

    async fn force_flush(&self) -> anyhow::Result<()> {
        let mut items = self.items.lock().await;
        if !items.is_empty() {
            ndjson::append_lines(&self.path, &items)?;
            items.clear();
        }
        Ok(())
    }
}

/// Emission counter and stop flag share one lock: the read-modify-write
/// that decides "did we just hit quota" is a single critical section, so
/// the counter itself never exceeds `max_total_urls`.
struct QuotaTracker {
    state: Mutex<(usize, bool)>,
    max_total: usize,
}

enum EmissionOutcome {
    /// The counter was already at quota before this call; the caller's
    /// result is discarded (not counted) and it must stop.
    AlreadyAtQuota,
    /// This call's emission was counted; `stop` is set once the counter
    /// reaches quota.
    Counted { stop: bool },
}

impl QuotaTracker {
    fn new(max_total: usize) -> Self {
        Self { state: Mutex::new((0, false)), max_total }
    }

    async fn is_stopped(&self) -> bool {
        self.state.lock().await.1
    }

    async fn record_emission(&self) -> EmissionOutcome {
        let mut state = self.state.lock().await;
        if state.0 >= self.max_total {
            state.1 = true;
            return EmissionOutcome::AlreadyAtQuota;
        }
        state.0 += 1;
        if state.0 >= self.max_total {
            state.1 = true;
        }
        EmissionOutcome::Counted { stop: state.1 }
    }

    async fn count(&self) -> usize {
        self.state.lock().await.0
    }
}

async fn fetch_once(client: &Client, url: &str, timeout_secs: u64) -> Result<String, FetchError> {
    let result = client.get(url).timeout(Duration::from_secs(timeout_secs)).send().await;
    let response = match result {
        Ok(r) => r,
        Err(error) if error.is_timeout() => return Err(FetchError::Timeout { url: url.to_string() }),
        Err(error) => return Err(FetchError::Connection { url: url.to_string(), source: error }),
    };
    let status = response.status();
    if status.is_success() {
        response
            .text()
            .await
            .map_err(|error| FetchError::Connection { url: url.to_string(), source: error })
    } else if matches!(status.as_u16(), 404 | 403 | 410) {
        Err(FetchError::Permanent { status: status.as_u16(), url: url.to_string() })
    } else {
        Err(FetchError::TransientStatus { status: status.as_u16(), url: url.to_string() })
    }
}

async fn fetch_with_retry(client: &Client, url: &str, cfg: &CrawlerConfig) -> Result<String, FetchError> {
    let mut last_err = None;
    for attempt in 1..=cfg.max_retries {
        match fetch_once(client, url, cfg.request_timeout).await {
            Ok(body) => return Ok(body),
            Err(error) if !error.is_retryable() => return Err(error),
            Err(error) => {
                tracing::warn!(url, attempt, error = %error, "retryable fetch failure");
                last_err = Some(error);
                if attempt < cfg.max_retries {
                    sleep(Duration::from_secs(attempt as u64 * cfg.retry_backoff)).await;
                }
            }
        }
    }
    Err(last_err.expect("Crawler::new enforces max_retries >= 1"))
}

pub struct Crawler {
    cfg: CrawlerConfig,
    client: Client,
    robots: RobotsCache,
    admission: HostAdmission,
    visited: VisitedStore,
    buffer: ScrapedBuffer,
    quota: QuotaTracker,
    queue: WorkQueue,
}

impl Crawler {
    pub fn new(cfg: CrawlerConfig) -> anyhow::Result<Self> {
        anyhow::ensure!(cfg.max_retries >= 1, "max_retries must be at least 1, got {}", cfg.max_retries);
        let client = Client::builder()
            .user_agent(cfg.user_agent.as_str())
            .pool_max_idle_per_host(cfg.max_global_workers)
            .pool_idle_timeout(Duration::from_secs(300))
            .build()?;
        let robots = RobotsCache::new(client.clone());
        let admission = HostAdmission::new(cfg.max_concurrent_per_host);
        let visited = VisitedStore::new(cfg.visited_path.clone());
        let buffer = ScrapedBuffer::new(cfg.scraped_path.clone(), cfg.save_chunk_size);
        let quota = QuotaTracker::new(cfg.max_total_urls);
        Ok(Self { cfg, client, robots, admission, visited, buffer, quota, queue: WorkQueue::new() })
    }

    /// Sets the stop flag and forces a buffer flush. The external
    /// interrupt path (`Ctrl-C`) is driven from outside via this method,
    /// racing the worker pool with `tokio::select!` in the binary.
    pub async fn request_shutdown(&self) -> anyhow::Result<()> {
        self.quota.state.lock().await.1 = true;
        self.buffer.force_flush().await
    }

    /// Runs the crawl to completion (quota reached, seeds exhausted, or
    /// shutdown requested) and returns the total successful emission count.
    pub async fn run(self: &Arc<Self>, seeds: Vec<String>) -> anyhow::Result<usize> {
        let resumed = self.visited.load_resume_log().await?;
        tracing::info!(resumed, "loaded visited URLs from resume log");

        for seed in seeds {
            if !self.visited.contains(&seed).await {
                self.queue.enqueue(seed).await;
            }
        }
        tracing::info!(
            max_total_urls = self.cfg.max_total_urls,
            max_global_workers = self.cfg.max_global_workers,
            max_concurrent_per_host = self.cfg.max_concurrent_per_host,
            "starting crawl"
        );

        let mut handles = Vec::with_capacity(self.cfg.max_global_workers);
        for id in 0..self.cfg.max_global_workers {
            let this = Arc::clone(self);
            handles.push(tokio::spawn(async move { this.worker(id).await }));
        }
        for handle in handles {
            if let Err(error) = handle.await {
                tracing::error!(%error, "crawler worker panicked");
            }
        }

        self.buffer.force_flush().await?;
        let total = self.quota.count().await;
        tracing::info!(total, "crawler finished");
        Ok(total)
    }

    async fn worker(&self, id: usize) {
        loop {
            let Some(url) = self.queue.dequeue().await else {
                tracing::info!(worker = id, "queue idle, shutting down");
                break;
            };

            if self.quota.is_stopped().await {
                tracing::info!(worker = id, url, "stop flag set, discarding");
                break;
            }

            let inserted = match self.visited.check_and_insert(&url).await {
                Ok(inserted) => inserted,
                Err(error) => {
                    tracing::error!(%error, url, "failed to append visited log");
                    continue;
                }
            };
            if !inserted {
                continue;
            }

            if self.cfg.respect_robots {
                match reqwest::Url::parse(&url) {
                    Ok(parsed) => {
                        if !self.robots.can_fetch(&parsed, &self.cfg.user_agent).await {
                            tracing::info!(worker = id, url, "blocked by robots.txt");
                            continue;
                        }
                    }
                    Err(_) => continue,
                }
            }

            let host = reqwest::Url::parse(&url)
                .ok()
                .and_then(|u| parser::netloc(&u))
                .unwrap_or_default();

            let _permit = self.admission.acquire(&host).await;
            sleep(Duration::from_secs_f64(self.cfg.delay_between_requests)).await;

            tracing::info!(worker = id, url, "fetching");
            match fetch_with_retry(&self.client, &url, &self.cfg).await {
                Ok(html) => {
                    let doc = parser::parse(&html, &url, chrono::Local::now().to_rfc3339());
                    let new_links: Vec<String> = {
                        let mut fresh = Vec::new();
                        for link in &doc.links_found {
                            if !self.visited.contains(link).await {
                                fresh.push(link.clone());
                            }
                        }
                        fresh
                    };

                    if let Err(error) = self.buffer.push_and_maybe_flush(doc).await {
                        tracing::error!(%error, url, "failed to append scraped log");
                    }
                    for link in new_links {
                        self.queue.enqueue(link).await;
                    }

                    match self.quota.record_emission().await {
                        EmissionOutcome::AlreadyAtQuota => {
                            tracing::info!(worker = id, "quota already reached, discarding result");
                            self.queue.drain().await;
                            break;
                        }
                        EmissionOutcome::Counted { stop } => {
                            if stop {
                                tracing::info!(worker = id, "quota reached, draining queue");
                                self.queue.drain().await;
                                break;
                            }
                        }
                    }
                }
                Err(error) => {
                    tracing::warn!(worker = id, url = error.url(), error = %error, "permanent fetch failure");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn visited_store_dispatches_each_url_exactly_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(VisitedStore::new(dir.path().join("visited.ndjson")));

        let mut handles = Vec::new();
        for _ in 0..20 {
            let store = store.clone();
            handles.push(tokio::spawn(async move { store.check_and_insert("https://a.example").await.unwrap() }));
        }
        let mut newly_inserted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                newly_inserted += 1;
            }
        }
        assert_eq!(newly_inserted, 1);
    }

    #[tokio::test]
    async fn quota_tracker_never_exceeds_max() {
        let tracker = Arc::new(QuotaTracker::new(3));
        let mut handles = Vec::new();
        for _ in 0..10 {
            let tracker = tracker.clone();
            handles.push(tokio::spawn(async move { tracker.record_emission().await }));
        }
        for handle in handles {
            let _ = handle.await.unwrap();
        }
        assert!(tracker.count().await <= 3);
        assert!(tracker.is_stopped().await);
    }
}
