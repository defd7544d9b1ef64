//! Auth header injection for trusted hosts.
//!
//! The token and the extra trusted hosts come from the environment so that
//! secrets never live in the YAML file.

use serde::{Deserialize, Serialize};
use std::env;

use super::ConfigError;

/// Configuration for injecting an auth header into requests to trusted hosts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Environment variable holding the auth header as `<name>=<value>`.
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Environment variable holding a comma separated list of trusted hosts.
    #[serde(default = "default_domains_env")]
    pub whitelisted_domains_env: String,

    /// Trusted hosts listed directly in the configuration.
    #[serde(default)]
    pub whitelisted_domains: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_env: default_token_env(),
            whitelisted_domains_env: default_domains_env(),
            whitelisted_domains: Vec::new(),
        }
    }
}

impl AuthConfig {
    /// Read the auth header from the environment.
    ///
    /// Returns `None` when the variable is unset or has no header name.
    pub fn token(&self) -> Option<(String, String)> {
        let raw = env::var(&self.token_env).ok()?;
        let Some((name, value)) = raw.split_once('=') else {
            tracing::warn!(token_env = %self.token_env, "Auth token is not of the form <header>=<value>");
            return None;
        };
        if name.trim().is_empty() {
            return None;
        }
        Some((name.trim().to_string(), value.to_string()))
    }

    /// Whether requests to `host` should carry the auth header.
    pub fn is_whitelisted(&self, host: &str) -> bool {
        if self.whitelisted_domains.iter().any(|d| d == host) {
            return true;
        }
        env::var(&self.whitelisted_domains_env)
            .map(|domains| domains.split(',').any(|d| !d.is_empty() && d.trim() == host))
            .unwrap_or(false)
    }

    /// Trust an additional host.
    pub fn with_domain(mut self, host: impl Into<String>) -> Self {
        self.whitelisted_domains.push(host.into());
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token_env.trim().is_empty() {
            return Err(ConfigError::Config("auth.token_env must not be empty".to_string()));
        }
        if self.whitelisted_domains.iter().any(|d| d.contains('/')) {
            return Err(ConfigError::Config(
                "auth.whitelisted_domains must list bare hosts, not URLs".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_token_env() -> String {
    "CL_AUTH_TOKEN".to_string()
}

fn default_domains_env() -> String {
    "CL_WHITE_LISTED_DOMAINS".to_string()
}
