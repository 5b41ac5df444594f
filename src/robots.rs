//! Per-origin `robots.txt` cache. One entry per scheme+host; first query
//! for an origin fetches and parses it (or caches an empty, permissive
//! policy on any non-200 or error), everything after answers from the
//! cached body.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::Client;
use robotstxt::DefaultMatcher;
use tokio::sync::Mutex;

pub struct RobotsCache {
    client: Client,
    // A single mutex guards both the lookup and the first-touch fetch so
    // concurrent first queries for the same origin don't race each other
    // into fetching robots.txt twice.
    entries: Mutex<HashMap<String, String>>,
}

impl RobotsCache {
    pub fn new(client: Client) -> Self {
        Self { client, entries: Mutex::new(HashMap::new()) }
    }

    pub async fn can_fetch(&self, url: &reqwest::Url, user_agent: &str) -> bool {
        let origin = format!("{}://{}", url.scheme(), url.host_str().unwrap_or_default());
        let mut entries = self.entries.lock().await;
        let body = if let Some(body) = entries.get(&origin) {
            body.clone()
        } else {
            let fetched = self.fetch_robots(&origin).await;
            entries.insert(origin, fetched.clone());
            fetched
        };
        drop(entries);
        DefaultMatcher::default().one_agent_allowed_by_robots(&body, user_agent, url.as_str())
    }

    async fn fetch_robots(&self, origin: &str) -> String {
        let robots_url = format!("{origin}/robots.txt");
        let result = self
            .client
            .get(&robots_url)
            .timeout(Duration::from_secs(5))
            .send()
            .await;
        match result {
            Ok(response) if response.status().is_success() => {
                response.text().await.unwrap_or_default()
            }
            Ok(_) | Err(_) => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_policy_is_permissive() {
        let matcher = DefaultMatcher::default();
        assert!(matcher.one_agent_allowed_by_robots("", "CustomCrawler/1.0", "https://a.example/x"));
    }

    #[test]
    fn disallow_all_blocks_everything() {
        let matcher = DefaultMatcher::default();
        let body = "User-agent: *\nDisallow: /\n";
        assert!(!matcher.one_agent_allowed_by_robots(body, "CustomCrawler/1.0", "https://a.example/x"));
    }
}
