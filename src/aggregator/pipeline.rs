//! The aggregation pipeline: fetch, parse, enrich, merge
//!
//! Per-source failures are isolated and logged; the pipeline as a whole
//! fails only when every source together contributed zero records.

use crate::aggregator::enricher::Enricher;
use crate::aggregator::fetcher::{FetchResult, FetcherConfig, SourceFetcher};
use crate::aggregator::geo::{GeoConfig, GeoResolver};
use crate::aggregator::models::{ProxyRecord, Subscription};
use crate::aggregator::parser::SubscriptionParser;
use crate::Result;
use anyhow::bail;
use std::time::Duration;

/// Default timeout for each network request in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Default number of sources fetched concurrently
const DEFAULT_CONCURRENCY: usize = 8;

/// Configuration for an aggregation run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Timeout applied to every network request
    pub timeout: Duration,
    /// How many sources to fetch at once
    pub concurrency: usize,
    /// Whether to geo-label and rename records; `false` is a strict
    /// merge of the fetched documents
    pub enrich: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            concurrency: DEFAULT_CONCURRENCY,
            enrich: true,
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_enrichment(mut self, enrich: bool) -> Self {
        self.enrich = enrich;
        self
    }
}

/// Flatten fetch results into one record sequence, preserving source
/// order and record order within each source
///
/// Failed fetches were already reported by the fetcher; parse failures
/// are reported here. Both contribute zero records.
pub fn collect_records(results: &[FetchResult]) -> Vec<ProxyRecord> {
    let mut records = Vec::new();

    for result in results {
        let Some(body) = result.body.as_deref() else {
            continue;
        };
        match SubscriptionParser::parse(body) {
            Ok(parsed) => {
                println!("  {}: {} proxies", result.source, parsed.len());
                records.extend(parsed);
            }
            Err(e) => {
                eprintln!("  {}: skipped ({})", result.source, e);
            }
        }
    }

    records
}

/// Drives one aggregation run end to end
pub struct Aggregator {
    config: PipelineConfig,
    fetcher: SourceFetcher,
    enricher: Enricher,
}

impl Aggregator {
    /// Create an aggregator with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(PipelineConfig::default())
    }

    /// Create an aggregator with custom configuration
    pub fn with_config(config: PipelineConfig) -> Result<Self> {
        let fetcher = SourceFetcher::with_config(
            FetcherConfig::new()
                .with_timeout(config.timeout)
                .with_concurrency(config.concurrency),
        )?;
        let resolver =
            GeoResolver::with_config(GeoConfig::new().with_timeout(config.timeout))?;

        Ok(Self {
            config,
            fetcher,
            enricher: Enricher::with_resolver(resolver),
        })
    }

    /// Run the pipeline over the given sources
    ///
    /// Errors only when the sources together yielded zero records; the
    /// caller writes the output, so nothing is written on that path.
    pub async fn run(&self, sources: &[String]) -> Result<Subscription> {
        println!("Fetching {} subscription sources...", sources.len());
        let results = self.fetcher.fetch_all(sources).await;

        let records = collect_records(&results);
        if records.is_empty() {
            bail!("no proxies collected from {} sources", sources.len());
        }
        println!("Collected {} proxies", records.len());

        let proxies = if self.config.enrich {
            self.enricher.enrich(records).await
        } else {
            records
        };

        Ok(Subscription::new(proxies))
    }
}
