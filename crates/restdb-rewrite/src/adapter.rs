//! Facade used by the query engine.
//!
//! [`RestAdapter`] is the single entry point the engine talks to: it decodes
//! virtual tables, rewrites statements before planning, and describes the
//! HTTP request a decoded table stands for.

use restdb_core::{
    AuthConfig, CodecError, DecomposedUri, QueryParams, RestDbConfig, VirtualTableUri,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::RewriteError;
use crate::rewriter::{PredicateRewriter, RewriteOutcome};

/// HTTP method of a planned request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
        }
    }
}

/// Everything an HTTP client needs to fetch a virtual table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointRequest {
    pub method: HttpMethod,
    pub url: String,
    pub query_params: QueryParams,
    pub headers: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
    /// JSONPath selecting rows from the response payload.
    pub fragment: String,
}

/// Adapter exposing REST endpoints as virtual tables.
#[derive(Debug, Clone, Default)]
pub struct RestAdapter {
    rewriter: PredicateRewriter,
    auth: AuthConfig,
}

impl RestAdapter {
    pub fn new(config: &RestDbConfig) -> Self {
        Self {
            rewriter: PredicateRewriter::from_config(config),
            auth: config.auth.clone(),
        }
    }

    /// Every virtual table is handled by this adapter.
    pub fn supports(&self, _uri: &str) -> bool {
        true
    }

    /// Statements are rewritten before planning.
    pub fn supports_query_manipulation(&self, _operation: &str) -> bool {
        true
    }

    /// Decode a virtual table, merging repeated headers.
    pub fn parse_uri(&self, uri: &str) -> Result<VirtualTableUri, CodecError> {
        VirtualTableUri::decode(uri)
    }

    /// Decode a virtual table with one value per parameter and header.
    pub fn decompose_uri(&self, uri: &str) -> Result<DecomposedUri, CodecError> {
        DecomposedUri::decode(uri)
    }

    /// Rewrite a statement, reporting failures to the caller.
    pub fn rewrite(&self, uri: &str, operation: &str) -> Result<RewriteOutcome, RewriteError> {
        self.rewriter.rewrite(uri, operation)
    }

    /// Rewrite a statement and return the new `(uri, operation)` pair.
    ///
    /// Never fails: on error the input pair is returned unchanged.
    pub fn parse_operation_and_uri(&self, uri: &str, operation: &str) -> (String, String) {
        tracing::info!(uri, operation, "Rewriting operation");

        match self.rewriter.rewrite(uri, operation) {
            Ok(outcome) => (outcome.uri, outcome.sql),
            Err(error) => {
                tracing::error!(
                    uri,
                    operation,
                    error = %error,
                    "Failed to rewrite operation, passing it through"
                );
                (uri.to_string(), operation.to_string())
            }
        }
    }

    /// Describe the request for `uri` against `host`.
    ///
    /// HTTPS is used unless `is_https` is `Some(false)`. Trusted hosts get the
    /// configured auth header.
    pub fn request(
        &self,
        uri: &str,
        host: &str,
        is_https: Option<bool>,
    ) -> Result<EndpointRequest, CodecError> {
        let table = VirtualTableUri::decode(uri)?;
        let host = host.trim().trim_end_matches('/');

        let scheme = if is_https == Some(false) { "http" } else { "https" };
        let path = if table.path.is_empty() || table.path.starts_with('/') {
            table.path
        } else {
            tracing::debug!(path = %table.path, "Prefixing path with '/'");
            format!("/{}", table.path)
        };

        let mut headers = table.headers;
        if self.auth.is_whitelisted(host) {
            match self.auth.token() {
                Some((name, value)) => {
                    headers.insert(name, value);
                }
                None => tracing::warn!(
                    host,
                    token_env = %self.auth.token_env,
                    "Trusted host but no auth token configured"
                ),
            }
        }

        let method = if table.body.is_some() {
            HttpMethod::Post
        } else {
            HttpMethod::Get
        };

        Ok(EndpointRequest {
            method,
            url: format!("{scheme}://{host}{path}"),
            query_params: table.query_params,
            headers,
            body: table.body,
            fragment: table.fragment,
        })
    }
}
