//! Blocking page fetch.
//!
//! Sources talk to the network only through `PageFetcher`, so tests can serve
//! canned pages from memory.

#[cfg(test)]
use std::collections::HashMap;
use std::time::Duration;

use reqwest::blocking::Client;

use crate::error::AppError;

pub trait PageFetcher {
    /// GET `url` and return the body text. Non-2xx responses are errors.
    fn fetch_page(&self, url: &str) -> Result<String, AppError>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout_secs: u64) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("rate-ledger/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::config(format!("failed to build http client: {e}")))?;
        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch_page(&self, url: &str) -> Result<String, AppError> {
        tracing::debug!(url, "GET");
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| AppError::transport(format!("request to {url} failed: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .map_err(|e| AppError::transport(format!("failed to read body from {url}: {e}")))?;

        if !status.is_success() {
            return Err(AppError::transport(format!(
                "{url} returned status {status}: {}",
                truncate(&body, 200)
            )));
        }
        Ok(body)
    }
}

/// In-memory fetcher keyed by exact URL.
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub struct StaticFetcher {
    pages: HashMap<String, String>,
}

#[cfg(test)]
impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.pages.insert(url.into(), body.into());
        self
    }
}

#[cfg(test)]
impl PageFetcher for StaticFetcher {
    fn fetch_page(&self, url: &str) -> Result<String, AppError> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| AppError::transport(format!("{url} returned status 404 Not Found")))
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
