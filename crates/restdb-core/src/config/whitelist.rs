//! Whitelist of bare predicate names.
//!
//! A whitelisted column lets a query say `org_id = 'X'` instead of the tagged
//! form `"HEADERx-cleartax-orgunit" = 'X'`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ConfigError;

/// Short predicate names mapped to canonical request names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhitelistConfig {
    /// `short_name -> header name`.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// `short_name -> query parameter name`.
    #[serde(default)]
    pub query_params: BTreeMap<String, String>,
}

impl WhitelistConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `short_name` to the header `canonical`.
    pub fn with_header(mut self, short_name: impl Into<String>, canonical: impl Into<String>) -> Self {
        self.headers.insert(short_name.into(), canonical.into());
        self
    }

    /// Map `short_name` to the query parameter `canonical`.
    pub fn with_query_param(
        mut self,
        short_name: impl Into<String>,
        canonical: impl Into<String>,
    ) -> Self {
        self.query_params.insert(short_name.into(), canonical.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.query_params.is_empty()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (short, canonical) in self.headers.iter().chain(&self.query_params) {
            if short.trim().is_empty() || canonical.trim().is_empty() {
                return Err(ConfigError::Config(format!(
                    "whitelist entry '{short}' -> '{canonical}' has an empty name"
                )));
            }
        }

        // Header pairs are encoded as `name:value` and split on the first colon.
        if let Some((short, canonical)) = self.headers.iter().find(|(_, c)| c.contains(':')) {
            return Err(ConfigError::Config(format!(
                "whitelisted header '{short}' maps to '{canonical}', which contains ':'"
            )));
        }

        if let Some(short) = self.headers.keys().find(|k| self.query_params.contains_key(*k)) {
            return Err(ConfigError::Config(format!(
                "'{short}' is whitelisted both as a header and as a query parameter"
            )));
        }

        Ok(())
    }
}
