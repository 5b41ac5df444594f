//! Fetch-failure taxonomy for the crawler's retry policy (see the crawler
//! driver's failure policy: permanent HTTP codes abandon the URL outright,
//! everything else is retried with linear backoff until `max_retries` is
//! exhausted).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("permanent HTTP status {status} for {url}")]
    Permanent { status: u16, url: String },

    #[error("transient HTTP status {status} for {url}")]
    TransientStatus { status: u16, url: String },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("connection error for {url}: {source}")]
    Connection { url: String, #[source] source: reqwest::Error },
}

impl FetchError {
    /// Permanent HTTP statuses (404/403/410) are not retryable; everything
    /// else (other statuses, timeouts, connection errors) is.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, FetchError::Permanent { .. })
    }

    pub fn url(&self) -> &str {
        match self {
            FetchError::Permanent { url, .. }
            | FetchError::TransientStatus { url, .. }
            | FetchError::Timeout { url }
            | FetchError::Connection { url, .. } => url,
        }
    }
}
