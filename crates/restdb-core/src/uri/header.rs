//! Header pairs carried in the query string as `header<N>=<name>:<value>`.

use std::collections::{BTreeMap, BTreeSet};

use super::CodecError;

/// A single `name:value` header pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpHeader {
    pub key: String,
    pub value: String,
}

impl HttpHeader {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Parse `name:value`, splitting on the first colon.
    pub fn parse(pair: &str) -> Result<Self, CodecError> {
        let (key, value) = pair
            .split_once(':')
            .ok_or_else(|| CodecError::MalformedHeader(pair.to_string()))?;
        Ok(Self::new(key, value))
    }

    /// Group values per header name.
    ///
    /// Values are deduplicated, sorted and comma-joined. Pairs with an empty
    /// name or value are dropped.
    pub fn merge_multi_valued(headers: &[HttpHeader]) -> BTreeMap<String, String> {
        let mut grouped: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for header in headers {
            if header.key.is_empty() || header.value.is_empty() {
                continue;
            }
            grouped
                .entry(header.key.as_str())
                .or_default()
                .insert(header.value.as_str());
        }

        grouped
            .into_iter()
            .map(|(key, values)| (key.to_string(), values.into_iter().collect::<Vec<_>>().join(",")))
            .collect()
    }

    /// One value per header name; the last occurrence wins.
    pub fn merge_single_valued(headers: &[HttpHeader]) -> BTreeMap<String, String> {
        headers
            .iter()
            .map(|h| (h.key.clone(), h.value.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_splits_on_first_colon() {
        let header = HttpHeader::parse("x-time:12:30").unwrap();
        assert_eq!(header, HttpHeader::new("x-time", "12:30"));
    }

    #[test]
    fn test_parse_without_colon() {
        assert!(matches!(
            HttpHeader::parse("x-clear-node-id"),
            Err(CodecError::MalformedHeader(_))
        ));
    }

    #[test]
    fn test_merge_multi_valued() {
        let headers = vec![
            HttpHeader::new("x-clear-node-id", "node-9"),
            HttpHeader::new("x-clear-node-id", "node-6"),
            HttpHeader::new("x-clear-node-id", "node-9"),
            HttpHeader::new("x-cleartax-orgunit", "org-1"),
            HttpHeader::new("x-empty", ""),
        ];

        let merged = HttpHeader::merge_multi_valued(&headers);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged["x-clear-node-id"], "node-6,node-9");
        assert_eq!(merged["x-cleartax-orgunit"], "org-1");
    }

    #[test]
    fn test_merge_single_valued_last_wins() {
        let headers = vec![
            HttpHeader::new("x-clear-node-id", "node-9"),
            HttpHeader::new("x-clear-node-id", "node-6"),
        ];
        let merged = HttpHeader::merge_single_valued(&headers);
        assert_eq!(merged["x-clear-node-id"], "node-6");
    }
}
