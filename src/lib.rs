//! Clash Aggregator - Subscription Merger
//!
//! Aggregates Clash proxy subscriptions from many remote sources into
//! one merged feed, with each entry renamed after the country its
//! server resolves to.

pub mod aggregator;

pub use aggregator::*;

/// Application result type
pub type Result<T> = anyhow::Result<T>;
