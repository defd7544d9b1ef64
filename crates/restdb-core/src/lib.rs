//! # restdb-core
//!
//! Shared types for treating a REST endpoint as a SQL virtual table.
//!
//! A virtual table is a single string that carries everything needed to
//! issue an HTTP request:
//!
//! ```text
//! /reports/v2.0/ledgers?count=100&header1=x-clear-node-id:node-6&body=%7B%7D#$.data[*]
//! \___________________/ \_______/ \___________________________/ \_________/ \_______/
//!          path           params            headers                 body     jsonpath
//! ```
//!
//! This crate owns the data model ([`VirtualTableUri`]), its codec, and the
//! configuration ([`RestDbConfig`]) shared by the rewriter and the CLI.

pub mod config;
pub mod uri;

pub use config::{AuthConfig, ConfigError, RestDbConfig, SqlDialect, WhitelistConfig};
pub use uri::{
    CodecError, DEFAULT_FRAGMENT, DecomposedUri, HttpHeader, QueryParams, VirtualTableUri,
    append_to_query, decode_body, encode_body, encode_header_pair, encode_query_pair,
};
