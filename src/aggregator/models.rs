//! Data model for subscription aggregation

use crate::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::fmt;

/// Sentinel code for servers whose location could not be resolved
pub const UNKNOWN_COUNTRY: &str = "UN";

/// Placeholder glyph used instead of a flag for unresolved locations
pub const UNKNOWN_FLAG: &str = "\u{1F310}";

/// One proxy configuration entry from a subscription document
///
/// Only the `server` and `name` fields are ever interpreted; everything
/// else (protocol, port, credentials, ...) passes through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProxyRecord(Mapping);

impl ProxyRecord {
    /// The `server` hostname or IP, if present and a string
    pub fn server(&self) -> Option<&str> {
        self.field("server")
    }

    /// The display `name`, if present and a string
    pub fn name(&self) -> Option<&str> {
        self.field("name")
    }

    fn field(&self, key: &str) -> Option<&str> {
        let key = Value::String(key.to_string());
        self.0.get(&key).and_then(Value::as_str)
    }

    /// Return a copy of this record with its `name` overwritten
    pub fn with_name(&self, name: String) -> Self {
        let mut fields = self.0.clone();
        fields.insert(
            Value::String("name".to_string()),
            Value::String(name),
        );
        Self(fields)
    }

    /// Number of fields carried by the record
    pub fn field_count(&self) -> usize {
        self.0.len()
    }
}

impl From<Mapping> for ProxyRecord {
    fn from(fields: Mapping) -> Self {
        Self(fields)
    }
}

/// ISO 3166-1 alpha-2 country code, or the unresolved sentinel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountryCode {
    Known(String),
    Unknown,
}

impl CountryCode {
    /// Normalize a raw code; anything other than two ASCII letters
    /// (or the `UN` sentinel itself) becomes `Unknown`
    pub fn parse(code: &str) -> Self {
        let code = code.trim().to_ascii_uppercase();
        if code.len() == 2
            && code.bytes().all(|b| b.is_ascii_uppercase())
            && code != UNKNOWN_COUNTRY
        {
            CountryCode::Known(code)
        } else {
            CountryCode::Unknown
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            CountryCode::Known(code) => code,
            CountryCode::Unknown => UNKNOWN_COUNTRY,
        }
    }

    /// Flag glyph for the code: each letter maps to its Unicode
    /// regional-indicator symbol. `Unknown` gets a globe placeholder.
    pub fn flag(&self) -> String {
        match self {
            CountryCode::Known(code) => code
                .chars()
                .filter_map(|c| char::from_u32(127_397 + c as u32))
                .collect(),
            CountryCode::Unknown => UNKNOWN_FLAG.to_string(),
        }
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The merged subscription document: `{ proxies: [...] }`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Subscription {
    pub proxies: Vec<ProxyRecord>,
}

impl Subscription {
    pub fn new(proxies: Vec<ProxyRecord>) -> Self {
        Self { proxies }
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    /// Serialize to the output document: a commented header followed by
    /// the YAML body
    pub fn to_yaml(&self) -> Result<String> {
        let body = serde_yaml::to_string(self)?;
        let updated = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        Ok(format!(
            "# Last Update: {}\n# Total Proxies: {}\n# Generated by clash-aggregator\n\n{}",
            updated,
            self.len(),
            body
        ))
    }

    /// Parse a subscription document (header comments are plain YAML
    /// comments, so this also round-trips `to_yaml` output)
    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }
}
