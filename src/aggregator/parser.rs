//! Parser for extracting proxy records from subscription documents

use crate::aggregator::models::ProxyRecord;
use crate::Result;
use anyhow::bail;
use serde_yaml::Value;

/// Parses fetched subscription bodies into proxy records
pub struct SubscriptionParser;

impl SubscriptionParser {
    /// Extract the proxy records from one YAML document
    ///
    /// Errors on malformed YAML or a document without a list-valued
    /// `proxies` key; callers treat either as zero records from that
    /// source. Entries that are not mappings are skipped, mapping
    /// entries keep every field as-is.
    pub fn parse(content: &str) -> Result<Vec<ProxyRecord>> {
        let document: Value = serde_yaml::from_str(content)?;

        let Some(entries) = document.get("proxies").and_then(Value::as_sequence) else {
            bail!("document has no proxies list");
        };

        Ok(entries
            .iter()
            .filter_map(|entry| entry.as_mapping().cloned().map(ProxyRecord::from))
            .collect())
    }

    /// Like [`parse`](Self::parse) but swallows the error into an empty
    /// record list
    pub fn parse_or_empty(content: &str) -> Vec<ProxyRecord> {
        Self::parse(content).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_DOC: &str = r#"
proxies:
  - name: node-a
    server: 1.2.3.4
    port: 443
    type: vmess
    uuid: d9c74c9e-4c75-4c62-9f5c-8f6e1c2a7b31
  - name: node-b
    server: example.com
    port: 8388
    type: ss
    cipher: aes-256-gcm
    password: secret
"#;

    #[test]
    fn test_parse_valid_document() {
        let records = SubscriptionParser::parse(VALID_DOC).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name(), Some("node-a"));
        assert_eq!(records[0].server(), Some("1.2.3.4"));
        assert_eq!(records[1].server(), Some("example.com"));
    }

    #[test]
    fn test_parse_preserves_unknown_fields() {
        let records = SubscriptionParser::parse(VALID_DOC).unwrap();
        // 5 fields on the vmess entry, none interpreted away
        assert_eq!(records[0].field_count(), 5);
        // 6 on the ss entry
        assert_eq!(records[1].field_count(), 6);
    }

    #[test]
    fn test_parse_malformed_yaml() {
        assert!(SubscriptionParser::parse("proxies: [unclosed").is_err());
    }

    #[test]
    fn test_parse_missing_proxies_key() {
        assert!(SubscriptionParser::parse("rules:\n  - MATCH,DIRECT\n").is_err());
    }

    #[test]
    fn test_parse_proxies_not_a_list() {
        assert!(SubscriptionParser::parse("proxies: 42\n").is_err());
    }

    #[test]
    fn test_parse_empty_proxies_list() {
        let records = SubscriptionParser::parse("proxies: []\n").unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_parse_skips_non_mapping_entries() {
        let doc = r#"
proxies:
  - name: node-a
    server: 1.2.3.4
  - just-a-string
  - 17
  - name: node-b
    server: 5.6.7.8
"#;
        let records = SubscriptionParser::parse(doc).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name(), Some("node-a"));
        assert_eq!(records[1].name(), Some("node-b"));
    }

    #[test]
    fn test_parse_or_empty_swallows_errors() {
        assert!(SubscriptionParser::parse_or_empty("not: relevant\n").is_empty());
        assert!(SubscriptionParser::parse_or_empty(": : :").is_empty());
        assert_eq!(SubscriptionParser::parse_or_empty(VALID_DOC).len(), 2);
    }
}
