//! Predicate name resolution.
//!
//! A predicate column is turned into a request binding by, in order:
//!
//! 1. an explicit tag: `QUERY_PARAM<name>` or `HEADER<name>`;
//! 2. a whitelist lookup of the bare column name.
//!
//! Anything else is an ordinary column and stays in the SQL.

use restdb_core::{WhitelistConfig, encode_header_pair, encode_query_pair};
use serde::Serialize;
use std::fmt;

/// Prefix marking a column as a query parameter.
pub const QUERY_PARAM_TAG: &str = "QUERY_PARAM";

/// Prefix marking a column as a request header.
pub const HEADER_TAG: &str = "HEADER";

/// Where an extracted predicate value goes in the request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum BindingTarget {
    QueryParam(String),
    Header(String),
}

impl BindingTarget {
    pub fn name(&self) -> &str {
        match self {
            BindingTarget::QueryParam(name) | BindingTarget::Header(name) => name,
        }
    }

    /// The encoded query pair carrying `value` for this target.
    pub fn encode_pair(&self, value: &str) -> String {
        match self {
            BindingTarget::QueryParam(name) => encode_query_pair(name, value),
            BindingTarget::Header(name) => encode_header_pair(name, value),
        }
    }
}

impl fmt::Display for BindingTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingTarget::QueryParam(name) => write!(f, "query param {name}"),
            BindingTarget::Header(name) => write!(f, "header {name}"),
        }
    }
}

/// An extracted predicate: one target and its values in source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PredicateBinding {
    pub target: BindingTarget,
    pub values: Vec<String>,
}

/// Resolves predicate column names to binding targets.
#[derive(Debug, Clone, Default)]
pub struct NameResolver {
    whitelist: WhitelistConfig,
}

impl NameResolver {
    pub fn new(whitelist: WhitelistConfig) -> Self {
        Self { whitelist }
    }

    pub fn whitelist(&self) -> &WhitelistConfig {
        &self.whitelist
    }

    /// Resolve a column name (quotes are ignored).
    pub fn resolve(&self, column: &str) -> Option<BindingTarget> {
        let column = column.trim_matches('"');

        if let Some(name) = column.strip_prefix(QUERY_PARAM_TAG) {
            return tagged(name).map(BindingTarget::QueryParam);
        }
        if let Some(name) = column.strip_prefix(HEADER_TAG) {
            return tagged(name).map(BindingTarget::Header);
        }

        if let Some(canonical) = self.whitelist.headers.get(column) {
            return Some(BindingTarget::Header(canonical.clone()));
        }
        self.whitelist
            .query_params
            .get(column)
            .map(|canonical| BindingTarget::QueryParam(canonical.clone()))
    }
}

fn tagged(name: &str) -> Option<String> {
    let name = name.trim_matches('"');
    (!name.is_empty()).then(|| name.to_string())
}
