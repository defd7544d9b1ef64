//! Virtual-table URI codec.
//!
//! Grammar:
//!
//! ```text
//! <path>[?<query>][&header<N>=<name>:<value>]*[&body=<url-encoded-JSON>]#<jsonpath>
//! ```
//!
//! Any query key starting with `header` carries a `name:value` header pair,
//! the key `body` carries the JSON request body, and every other key is an
//! ordinary query parameter. The fragment is a JSONPath selecting rows from
//! the response and defaults to [`DEFAULT_FRAGMENT`].

mod header;
mod params;

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;
use url::{Url, form_urlencoded};

pub use header::HttpHeader;
pub use params::QueryParams;

/// JSONPath used when a virtual table has no fragment.
pub const DEFAULT_FRAGMENT: &str = "$[*]";

const HEADER_KEY_PREFIX: &str = "header";
const BODY_KEY: &str = "body";

/// Errors raised while decoding a virtual table.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("malformed header pair '{0}', expected <name>:<value>")]
    MalformedHeader(String),

    #[error("malformed request body: {0}")]
    Body(#[from] serde_json::Error),

    #[error("malformed percent-encoding: {0}")]
    Encoding(String),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// A fully decoded virtual table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VirtualTableUri {
    pub path: String,
    pub query_params: QueryParams,
    /// Header values are sorted, deduplicated and comma-joined per name.
    pub headers: BTreeMap<String, String>,
    pub body: Option<serde_json::Value>,
    pub fragment: String,
}

impl VirtualTableUri {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query_params: QueryParams::new(),
            headers: BTreeMap::new(),
            body: None,
            fragment: DEFAULT_FRAGMENT.to_string(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.append(key, value);
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_fragment(mut self, fragment: impl Into<String>) -> Self {
        let fragment = fragment.into();
        self.fragment = if fragment.is_empty() {
            DEFAULT_FRAGMENT.to_string()
        } else {
            fragment
        };
        self
    }

    /// Render the virtual table string.
    pub fn encode(&self) -> String {
        let mut uri = self.path.clone();
        let mut separator = '?';

        if !self.query_params.is_empty() {
            let query = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(self.query_params.pairs())
                .finish();
            uri.push(separator);
            uri.push_str(&query);
            separator = '&';
        }

        for (n, (key, value)) in self.headers.iter().enumerate() {
            uri.push(separator);
            let _ = write!(
                uri,
                "{HEADER_KEY_PREFIX}{}={}:{}",
                n + 1,
                urlencoding::encode(key),
                urlencoding::encode(value)
            );
            separator = '&';
        }

        if let Some(body) = &self.body {
            uri.push(separator);
            let _ = write!(uri, "{BODY_KEY}={}", encode_body(body));
        }

        // Decoding percent-decodes the fragment, so a literal '%' is escaped.
        uri.push('#');
        uri.push_str(&self.fragment.replace('%', "%25"));
        uri
    }

    /// Decode a virtual table, merging repeated headers.
    pub fn decode(uri: &str) -> Result<Self, CodecError> {
        let raw = RawVirtualTable::scan(uri)?;
        Ok(Self {
            path: raw.path,
            query_params: raw.query_params,
            headers: HttpHeader::merge_multi_valued(&raw.headers),
            body: raw.body,
            fragment: raw.fragment,
        })
    }
}

/// A decoded virtual table with one value per parameter and header.
///
/// Repeated query parameters are comma-joined; for repeated headers the
/// last occurrence wins.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecomposedUri {
    pub path: String,
    pub query_params: Vec<(String, String)>,
    pub headers: BTreeMap<String, String>,
    pub body: Option<serde_json::Value>,
    pub fragment: String,
}

impl DecomposedUri {
    pub fn decode(uri: &str) -> Result<Self, CodecError> {
        let raw = RawVirtualTable::scan(uri)?;
        Ok(Self {
            path: raw.path,
            query_params: raw.query_params.joined(),
            headers: HttpHeader::merge_single_valued(&raw.headers),
            body: raw.body,
            fragment: raw.fragment,
        })
    }
}

struct RawVirtualTable {
    path: String,
    query_params: QueryParams,
    headers: Vec<HttpHeader>,
    body: Option<serde_json::Value>,
    fragment: String,
}

impl RawVirtualTable {
    fn scan(uri: &str) -> Result<Self, CodecError> {
        let (path, query, fragment) = split_uri(uri)?;

        let mut query_params = QueryParams::new();
        let mut headers = Vec::new();
        let mut body = None;

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            // Blank values carry nothing and are dropped, as with HTML form parsing.
            if value.is_empty() {
                tracing::debug!(key = %key, "Skipping blank query value");
                continue;
            }
            if key.starts_with(HEADER_KEY_PREFIX) {
                headers.push(HttpHeader::parse(&value)?);
            } else if key == BODY_KEY {
                body = Some(serde_json::from_str(&value)?);
            } else {
                query_params.append(key, value);
            }
        }

        let fragment = match urlencoding::decode(&fragment) {
            Ok(decoded) if !decoded.is_empty() => decoded.into_owned(),
            Ok(_) => DEFAULT_FRAGMENT.to_string(),
            Err(e) => return Err(CodecError::Encoding(e.to_string())),
        };

        Ok(Self {
            path,
            query_params,
            headers,
            body,
            fragment,
        })
    }
}

/// Split a virtual table into `(path, query, fragment)`.
///
/// Absolute URLs keep only their path; the host is supplied separately when
/// a request is built.
fn split_uri(uri: &str) -> Result<(String, String, String), CodecError> {
    let uri = uri.trim();
    if uri.contains("://") {
        let url = Url::parse(uri)?;
        return Ok((
            url.path().to_string(),
            url.query().unwrap_or_default().to_string(),
            url.fragment().unwrap_or_default().to_string(),
        ));
    }

    let (rest, fragment) = uri.split_once('#').unwrap_or((uri, ""));
    let (path, query) = rest.split_once('?').unwrap_or((rest, ""));
    Ok((path.to_string(), query.to_string(), fragment.to_string()))
}

/// Percent-encode a JSON body for the `body=` query pair.
pub fn encode_body(body: &serde_json::Value) -> String {
    urlencoding::encode(&body.to_string()).into_owned()
}

/// Inverse of [`encode_body`].
pub fn decode_body(encoded: &str) -> Result<serde_json::Value, CodecError> {
    let decoded =
        urlencoding::decode(encoded).map_err(|e| CodecError::Encoding(e.to_string()))?;
    Ok(serde_json::from_str(&decoded)?)
}

/// `name=value` with both sides percent-encoded.
pub fn encode_query_pair(name: &str, value: &str) -> String {
    format!("{}={}", urlencoding::encode(name), urlencoding::encode(value))
}

/// `header=name:value` with name and value percent-encoded.
pub fn encode_header_pair(name: &str, value: &str) -> String {
    format!(
        "{HEADER_KEY_PREFIX}={}:{}",
        urlencoding::encode(name),
        urlencoding::encode(value)
    )
}

/// Append an already-encoded `pair` to the query part of `uri`.
///
/// A trailing fragment stays at the end of the result.
pub fn append_to_query(uri: &str, pair: &str) -> String {
    let (base, fragment) = match uri.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (uri, None),
    };

    let mut appended = base.to_string();
    if !appended.contains('?') {
        appended.push('?');
    } else if !appended.ends_with('&') && !appended.ends_with('?') {
        appended.push('&');
    }
    appended.push_str(pair);

    if let Some(fragment) = fragment {
        appended.push('#');
        appended.push_str(fragment);
    }
    appended
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_encode_path_only() {
        let uri = VirtualTableUri::new("/reports/v2.0/ledgers").encode();
        assert_eq!(uri, "/reports/v2.0/ledgers#$[*]");
    }

    #[test]
    fn test_encode_all_parts() {
        let uri = VirtualTableUri::new("/reports/v2.0/ledgers")
            .with_param("count", "100")
            .with_param("page", "5")
            .with_param("page", "6")
            .with_header("x-clear-node-id", "node-6")
            .with_header("x-cleartax-orgunit", "org-1")
            .with_body(json!({"a": 1}))
            .with_fragment("$.data[*]")
            .encode();

        assert_eq!(
            uri,
            "/reports/v2.0/ledgers?count=100&page=5&page=6\
             &header1=x-clear-node-id:node-6&header2=x-cleartax-orgunit:org-1\
             &body=%7B%22a%22%3A1%7D#$.data[*]"
        );
    }

    #[test]
    fn test_encode_headers_without_params() {
        let uri = VirtualTableUri::new("/ledgers")
            .with_header("x-cleartax-orgunit", "org-1")
            .encode();
        assert_eq!(uri, "/ledgers?header1=x-cleartax-orgunit:org-1#$[*]");

        let uri = VirtualTableUri::new("/ledgers").with_body(json!([1, 2])).encode();
        assert_eq!(uri, "/ledgers?body=%5B1%2C2%5D#$[*]");
    }

    #[test]
    fn test_round_trip() {
        let table = VirtualTableUri::new("/reports/v2.0/ledgers")
            .with_param("count", "100")
            .with_param("page", "5")
            .with_param("page", "6")
            .with_param("q", "a b&c")
            .with_header("x-clear-node-id", "node-6,node-9")
            .with_header("x-time", "12:30")
            .with_body(json!({"filter": {"status": "100% done"}}))
            .with_fragment("$.items[*]");

        let encoded = table.encode();
        let decoded = VirtualTableUri::decode(&encoded).unwrap();
        assert_eq!(decoded, table);
        assert_eq!(decoded.encode(), encoded);
    }

    #[test]
    fn test_fragment_with_percent_round_trips() {
        let table = VirtualTableUri::new("/items").with_fragment("$.rows[?(@.name == 'a%20b')]");
        let encoded = table.encode();
        assert_eq!(encoded, "/items#$.rows[?(@.name == 'a%2520b')]");
        assert_eq!(VirtualTableUri::decode(&encoded).unwrap(), table);
    }

    #[test]
    fn test_decode_rewritten_uri() {
        let decoded = VirtualTableUri::decode(
            "/reports/v2.0/ledgers?count=100&page=5&page=6\
             &header=x-clear-node-id:test-header-9&header=x-clear-node-id:test-header-6\
             &header=x-clear-node-type:node-type",
        )
        .unwrap();

        assert_eq!(decoded.path, "/reports/v2.0/ledgers");
        assert_eq!(decoded.query_params.get("count").unwrap(), ["100"]);
        assert_eq!(decoded.query_params.get("page").unwrap(), ["5", "6"]);
        assert_eq!(decoded.headers["x-clear-node-id"], "test-header-6,test-header-9");
        assert_eq!(decoded.headers["x-clear-node-type"], "node-type");
        assert_eq!(decoded.body, None);
        assert_eq!(decoded.fragment, DEFAULT_FRAGMENT);
    }

    #[test]
    fn test_decode_absolute_url() {
        let decoded =
            VirtualTableUri::decode("https://api.example.com/v1/items?limit=5#$.items[*]").unwrap();
        assert_eq!(decoded.path, "/v1/items");
        assert_eq!(decoded.query_params.get("limit").unwrap(), ["5"]);
        assert_eq!(decoded.fragment, "$.items[*]");
    }

    #[test]
    fn test_decode_empty_fragment_and_blank_values() {
        let decoded = VirtualTableUri::decode("/items?a=&b=1#").unwrap();
        assert_eq!(decoded.fragment, DEFAULT_FRAGMENT);
        assert_eq!(decoded.query_params.get("a"), None);
        assert_eq!(decoded.query_params.get("b").unwrap(), ["1"]);
    }

    #[test]
    fn test_decode_malformed_body() {
        let result = VirtualTableUri::decode("/items?body=%7Bnot-json");
        assert!(matches!(result, Err(CodecError::Body(_))));
    }

    #[test]
    fn test_decode_malformed_header() {
        let result = VirtualTableUri::decode("/items?header1=no-colon");
        assert!(matches!(result, Err(CodecError::MalformedHeader(_))));
    }

    #[test]
    fn test_decomposed_single_values() {
        let decomposed = DecomposedUri::decode(
            "/items?page=5&page=6&header=x-node:b&header=x-node:a#$.rows[*]",
        )
        .unwrap();

        assert_eq!(decomposed.query_params, vec![("page".to_string(), "5,6".to_string())]);
        assert_eq!(decomposed.headers["x-node"], "a");
        assert_eq!(decomposed.fragment, "$.rows[*]");
    }

    #[test]
    fn test_body_helpers() {
        let body = json!({"name": "a&b", "tags": ["x", "y"]});
        let encoded = encode_body(&body);
        assert!(!encoded.contains('&'));
        assert_eq!(decode_body(&encoded).unwrap(), body);
        assert!(decode_body("%7Bbroken").is_err());
    }

    #[test]
    fn test_append_to_query() {
        assert_eq!(append_to_query("/ledgers", "count=100"), "/ledgers?count=100");
        assert_eq!(
            append_to_query("/ledgers?count=100", "page=5"),
            "/ledgers?count=100&page=5"
        );
        assert_eq!(append_to_query("/ledgers?", "page=5"), "/ledgers?page=5");
        assert_eq!(
            append_to_query("/ledgers#$.data[*]", "page=5"),
            "/ledgers?page=5#$.data[*]"
        );
    }

    #[test]
    fn test_pair_encoding() {
        assert_eq!(encode_query_pair("count", "100"), "count=100");
        assert_eq!(encode_query_pair("q", "a&b"), "q=a%26b");
        assert_eq!(
            encode_header_pair("x-clear-node-id", "test-header-6"),
            "header=x-clear-node-id:test-header-6"
        );
    }
}
