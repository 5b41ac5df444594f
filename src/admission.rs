//! Per-host admission control: a host→semaphore map, created lazily on
//! first contact with a host. A worker holds its permit for the entire
//! fetch attempt, including the inter-request delay and every retry, so at
//! most `max_concurrent_per_host` fetches to one origin are ever in
//! flight.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};

pub struct HostAdmission {
    capacity: usize,
    hosts: Mutex<HashMap<String, Arc<Semaphore>>>,
}

impl HostAdmission {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, hosts: Mutex::new(HashMap::new()) }
    }

    pub async fn acquire(&self, host: &str) -> OwnedSemaphorePermit {
        let semaphore = {
            let mut hosts = self.hosts.lock().await;
            hosts
                .entry(host.to_string())
                .or_insert_with(|| Arc::new(Semaphore::new(self.capacity)))
                .clone()
        };
        semaphore
            .acquire_owned()
            .await
            .expect("host semaphore is never closed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn caps_concurrency_per_host() {
        let admission = Arc::new(HostAdmission::new(1));
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_observed = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..10 {
            let admission = admission.clone();
            let in_flight = in_flight.clone();
            let max_observed = max_observed.clone();
            handles.push(tokio::spawn(async move {
                let _permit = admission.acquire("example.com").await;
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                max_observed.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(max_observed.load(Ordering::SeqCst), 1);
    }
}
