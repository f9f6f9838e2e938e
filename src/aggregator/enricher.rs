//! Enricher that renames proxy records by country of origin
//!
//! Each record gets a fresh name of the form `<flag> <seq>` where the
//! sequence number counts records per country, in discovery order.

use crate::aggregator::geo::GeoResolver;
use crate::aggregator::models::{CountryCode, ProxyRecord};
use crate::Result;
use std::collections::HashMap;

/// Allocate the next per-country sequence number and format the display
/// name. Counters start at 1 and are independent per country, so the Nth
/// record seen for a country is always numbered N.
pub fn sequence_name(counters: &mut HashMap<String, u32>, country: &CountryCode) -> String {
    let counter = counters.entry(country.as_str().to_string()).or_insert(0);
    *counter += 1;
    format!("{} {:03}", country.flag(), counter)
}

/// Assigns geo-derived names to aggregated proxy records
pub struct Enricher {
    resolver: GeoResolver,
}

impl Enricher {
    /// Create an enricher with a default resolver
    pub fn new() -> Result<Self> {
        Ok(Self {
            resolver: GeoResolver::new()?,
        })
    }

    /// Create an enricher around an existing resolver
    pub fn with_resolver(resolver: GeoResolver) -> Self {
        Self { resolver }
    }

    /// Rename every record; one output record per input record, input
    /// order preserved
    ///
    /// Resolution runs sequentially so the counter state stays
    /// order-dependent; the counters live only for this call.
    pub async fn enrich(&self, records: Vec<ProxyRecord>) -> Vec<ProxyRecord> {
        let total = records.len();
        let mut counters: HashMap<String, u32> = HashMap::new();
        let mut unknown = 0usize;
        let mut enriched = Vec::with_capacity(total);

        for (index, record) in records.into_iter().enumerate() {
            let country = match record.server() {
                Some(host) => self.resolver.resolve_country(host).await,
                None => CountryCode::Unknown,
            };
            if country == CountryCode::Unknown {
                unknown += 1;
            }

            enriched.push(record.with_name(sequence_name(&mut counters, &country)));

            if (index + 1) % 50 == 0 {
                println!("  resolved {}/{} servers", index + 1, total);
            }
        }

        println!(
            "Resolved {} servers across {} countries ({} unresolved)",
            total,
            counters.len(),
            unknown
        );
        enriched
    }
}
