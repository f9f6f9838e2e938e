//! Source fetcher for retrieving remote subscription documents
//!
//! Every source is fetched independently: a dead URL or a non-200 answer
//! is recorded against that source and never aborts the batch.

use crate::Result;
use anyhow::bail;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::time::Duration;

/// Default timeout for each fetch in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Default number of sources fetched concurrently
const DEFAULT_CONCURRENCY: usize = 8;

/// Default user agent for HTTP requests
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Outcome of fetching a single source
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// The source URL that was fetched
    pub source: String,
    /// Raw document body, when the fetch succeeded
    pub body: Option<String>,
    /// Failure reason, when it did not
    pub error: Option<String>,
}

impl FetchResult {
    /// Create a successful fetch result
    pub fn success(source: String, body: String) -> Self {
        Self {
            source,
            body: Some(body),
            error: None,
        }
    }

    /// Create a failed fetch result
    pub fn failure(source: String, error: String) -> Self {
        Self {
            source,
            body: None,
            error: Some(error),
        }
    }

    /// Check if the fetch succeeded
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Configuration for the source fetcher
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Timeout applied to each HTTP request
    pub timeout: Duration,
    /// User agent for HTTP requests
    pub user_agent: String,
    /// How many sources to fetch at once
    pub concurrency: usize,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl FetcherConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }
}

/// Fetches subscription documents from remote sources
pub struct SourceFetcher {
    config: FetcherConfig,
    client: Client,
}

impl SourceFetcher {
    /// Create a new fetcher with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(FetcherConfig::default())
    }

    /// Create a new fetcher with custom configuration
    pub fn with_config(config: FetcherConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self { config, client })
    }

    /// Fetch a single source, requiring a 2xx status
    pub async fn fetch_one(&self, source: &str) -> Result<String> {
        let response = self.client.get(source).send().await?;
        let status = response.status();
        if !status.is_success() {
            bail!("HTTP status {}", status);
        }
        Ok(response.text().await?)
    }

    /// Fetch every source, concurrently, returning one result per source
    /// in the original source order regardless of completion order
    pub async fn fetch_all(&self, sources: &[String]) -> Vec<FetchResult> {
        let mut indexed = stream::iter(sources.iter().enumerate())
            .map(|(index, source)| async move {
                let result = match self.fetch_one(source).await {
                    Ok(body) => {
                        println!("  fetched {} ({} bytes)", source, body.len());
                        FetchResult::success(source.clone(), body)
                    }
                    Err(e) => {
                        eprintln!("  failed to fetch {}: {}", source, e);
                        FetchResult::failure(source.clone(), e.to_string())
                    }
                };
                (index, result)
            })
            .buffer_unordered(self.config.concurrency)
            .collect::<Vec<_>>()
            .await;

        indexed.sort_by_key(|(index, _)| *index);
        indexed.into_iter().map(|(_, result)| result).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetcher_config_default() {
        let config = FetcherConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.concurrency, DEFAULT_CONCURRENCY);
    }

    #[test]
    fn test_fetcher_config_builder() {
        let config = FetcherConfig::new()
            .with_timeout(Duration::from_secs(60))
            .with_user_agent("Custom Agent".to_string())
            .with_concurrency(2);

        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.user_agent, "Custom Agent");
        assert_eq!(config.concurrency, 2);
    }

    #[test]
    fn test_fetcher_config_concurrency_floor() {
        let config = FetcherConfig::new().with_concurrency(0);
        assert_eq!(config.concurrency, 1);
    }

    #[test]
    fn test_fetch_result_success() {
        let result = FetchResult::success(
            "https://example.com/sub.yaml".to_string(),
            "proxies: []".to_string(),
        );
        assert!(result.is_success());
        assert_eq!(result.body.as_deref(), Some("proxies: []"));
        assert!(result.error.is_none());
    }

    #[test]
    fn test_fetch_result_failure() {
        let result = FetchResult::failure(
            "https://example.com/sub.yaml".to_string(),
            "HTTP status 404 Not Found".to_string(),
        );
        assert!(!result.is_success());
        assert!(result.body.is_none());
        assert_eq!(result.error.as_deref(), Some("HTTP status 404 Not Found"));
    }

    #[tokio::test]
    async fn test_fetch_one_rejects_invalid_url() {
        let fetcher = SourceFetcher::new().unwrap();
        assert!(fetcher.fetch_one("not a url").await.is_err());
    }

    #[tokio::test]
    async fn test_fetch_all_keeps_source_order_on_failure() {
        let fetcher = SourceFetcher::new().unwrap();
        let sources = vec![
            "first bad url".to_string(),
            "second bad url".to_string(),
            "third bad url".to_string(),
        ];

        let results = fetcher.fetch_all(&sources).await;
        assert_eq!(results.len(), 3);
        for (result, source) in results.iter().zip(&sources) {
            assert_eq!(&result.source, source);
            assert!(!result.is_success());
        }
    }
}
