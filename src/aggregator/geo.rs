//! Geolocation of proxy servers via DNS-over-HTTPS and IP geolocation
//!
//! Resolution is best-effort enrichment: any failure at either hop
//! degrades to [`CountryCode::Unknown`] instead of surfacing an error.

use crate::aggregator::models::CountryCode;
use crate::Result;
use reqwest::Client;
use serde::Deserialize;
use std::net::IpAddr;
use std::time::Duration;

/// Default DNS-over-HTTPS resolver
const DEFAULT_DOH_ENDPOINT: &str = "https://dns.google/resolve";

/// Default IP geolocation service
const DEFAULT_GEO_ENDPOINT: &str = "http://ip-api.com/json";

/// Default timeout for each lookup in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Configuration for the geolocation resolver
#[derive(Debug, Clone)]
pub struct GeoConfig {
    /// DNS-over-HTTPS endpoint, queried as `<endpoint>?name=<host>`
    pub doh_endpoint: String,
    /// Geolocation endpoint, queried as `<endpoint>/<ip>?fields=countryCode`
    pub geo_endpoint: String,
    /// Timeout applied to each lookup request
    pub timeout: Duration,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            doh_endpoint: DEFAULT_DOH_ENDPOINT.to_string(),
            geo_endpoint: DEFAULT_GEO_ENDPOINT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl GeoConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_doh_endpoint(mut self, endpoint: String) -> Self {
        self.doh_endpoint = endpoint;
        self
    }

    pub fn with_geo_endpoint(mut self, endpoint: String) -> Self {
        self.geo_endpoint = endpoint;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// JSON shape of a DNS-over-HTTPS response
#[derive(Debug, Deserialize)]
struct DnsResponse {
    #[serde(rename = "Answer", default)]
    answer: Vec<DnsAnswer>,
}

#[derive(Debug, Deserialize)]
struct DnsAnswer {
    data: String,
}

/// JSON shape of the geolocation response
#[derive(Debug, Deserialize)]
struct GeoResponse {
    #[serde(rename = "countryCode")]
    country_code: Option<String>,
}

/// Pick the first answer that carries an IP address; CNAME records and
/// other non-address data are passed over
fn first_address(answers: &[DnsAnswer]) -> Option<IpAddr> {
    answers.iter().find_map(|answer| answer.data.parse().ok())
}

/// Resolves a hostname to a country code in two chained lookups
pub struct GeoResolver {
    config: GeoConfig,
    client: Client,
}

impl GeoResolver {
    /// Create a new resolver with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(GeoConfig::default())
    }

    /// Create a new resolver with custom configuration
    pub fn with_config(config: GeoConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    /// Resolve a host to its country code; never fails
    ///
    /// IP literals skip the DNS hop. No answer, no country field, or any
    /// transport error yields [`CountryCode::Unknown`].
    pub async fn resolve_country(&self, host: &str) -> CountryCode {
        let ip = match host.parse::<IpAddr>() {
            Ok(ip) => Some(ip),
            Err(_) => self.resolve_ip(host).await,
        };

        match ip {
            Some(ip) => match self.lookup_country(ip).await {
                Some(code) => CountryCode::parse(&code),
                None => CountryCode::Unknown,
            },
            None => CountryCode::Unknown,
        }
    }

    /// First hop: DNS-over-HTTPS lookup of the host
    async fn resolve_ip(&self, host: &str) -> Option<IpAddr> {
        let response = self
            .client
            .get(&self.config.doh_endpoint)
            .query(&[("name", host)])
            .send()
            .await
            .ok()?;
        if !response.status().is_success() {
            return None;
        }
        let dns: DnsResponse = response.json().await.ok()?;
        first_address(&dns.answer)
    }

    /// Second hop: country lookup for the resolved address
    async fn lookup_country(&self, ip: IpAddr) -> Option<String> {
        let url = format!("{}/{}", self.config.geo_endpoint, ip);
        let response = self
            .client
            .get(&url)
            .query(&[("fields", "countryCode")])
            .send()
            .await
            .ok()?;
        if !response.status().is_success() {
            return None;
        }
        let geo: GeoResponse = response.json().await.ok()?;
        geo.country_code
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geo_config_default() {
        let config = GeoConfig::default();
        assert_eq!(config.doh_endpoint, DEFAULT_DOH_ENDPOINT);
        assert_eq!(config.geo_endpoint, DEFAULT_GEO_ENDPOINT);
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn test_geo_config_builder() {
        let config = GeoConfig::new()
            .with_doh_endpoint("https://cloudflare-dns.com/dns-query".to_string())
            .with_geo_endpoint("http://ip-api.example/json".to_string())
            .with_timeout(Duration::from_secs(5));

        assert_eq!(config.doh_endpoint, "https://cloudflare-dns.com/dns-query");
        assert_eq!(config.geo_endpoint, "http://ip-api.example/json");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_dns_response_shape() {
        let payload = r#"{
            "Status": 0,
            "Answer": [
                { "name": "example.com.", "type": 1, "TTL": 300, "data": "93.184.216.34" }
            ]
        }"#;
        let dns: DnsResponse = serde_json::from_str(payload).unwrap();
        assert_eq!(
            first_address(&dns.answer),
            Some("93.184.216.34".parse().unwrap())
        );
    }

    #[test]
    fn test_dns_response_without_answer() {
        let dns: DnsResponse = serde_json::from_str(r#"{ "Status": 3 }"#).unwrap();
        assert!(dns.answer.is_empty());
        assert_eq!(first_address(&dns.answer), None);
    }

    #[test]
    fn test_first_address_skips_cname_records() {
        let payload = r#"{
            "Answer": [
                { "data": "alias.example.net." },
                { "data": "203.0.113.9" }
            ]
        }"#;
        let dns: DnsResponse = serde_json::from_str(payload).unwrap();
        assert_eq!(
            first_address(&dns.answer),
            Some("203.0.113.9".parse().unwrap())
        );
    }

    #[tokio::test]
    async fn test_resolve_country_tolerates_hostile_hostnames() {
        // unroutable endpoints, so both hops fail fast without network
        let config = GeoConfig::new()
            .with_doh_endpoint("http://127.0.0.1:1/resolve".to_string())
            .with_geo_endpoint("http://127.0.0.1:1/json".to_string())
            .with_timeout(Duration::from_millis(200));
        let resolver = GeoResolver::with_config(config).unwrap();

        // characters with query-string meaning must not panic or error
        for host in ["a b", "a&b=c", "host?x=1", "host#frag"] {
            assert_eq!(resolver.resolve_country(host).await, CountryCode::Unknown);
        }
    }

    #[test]
    fn test_geo_response_shape() {
        let geo: GeoResponse = serde_json::from_str(r#"{ "countryCode": "SG" }"#).unwrap();
        assert_eq!(geo.country_code.as_deref(), Some("SG"));

        let geo: GeoResponse = serde_json::from_str("{}").unwrap();
        assert!(geo.country_code.is_none());
    }
}
