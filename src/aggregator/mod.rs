//! Subscription aggregation module
//!
//! This module provides functionality for:
//! - Fetching remote subscription documents with per-source failure isolation
//! - Tolerantly extracting proxy records from YAML documents
//! - Resolving server locations via DNS-over-HTTPS and IP geolocation
//! - Renaming records with a flag glyph and per-country sequence number

pub mod enricher;
pub mod fetcher;
pub mod geo;
pub mod models;
pub mod parser;
pub mod pipeline;

pub use enricher::Enricher;
pub use fetcher::{FetchResult, FetcherConfig, SourceFetcher};
pub use geo::{GeoConfig, GeoResolver};
pub use models::{CountryCode, ProxyRecord, Subscription};
pub use parser::SubscriptionParser;
pub use pipeline::{Aggregator, PipelineConfig};
