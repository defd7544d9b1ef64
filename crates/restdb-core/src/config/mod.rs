//! Configuration types for RestDB.
//!
//! Configuration is loaded from a single YAML file (`restdb.yaml`). Every
//! field has a default, so an empty file yields a working configuration with
//! an empty whitelist.
//!
//! ```yaml
//! dialect: postgresql
//! whitelist:
//!   headers:
//!     org_id: x-cleartax-orgunit
//!   query_params:
//!     node_ids: nodeIds
//! auth:
//!   token_env: CL_AUTH_TOKEN
//!   whitelisted_domains_env: CL_WHITE_LISTED_DOMAINS
//! ```

pub mod auth;
pub mod whitelist;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use auth::AuthConfig;
pub use whitelist::WhitelistConfig;

/// Complete RestDB configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RestDbConfig {
    /// SQL dialect used to parse incoming statements.
    #[serde(default)]
    pub dialect: SqlDialect,

    /// Short predicate names mapped to canonical header/query-param names.
    #[serde(default)]
    pub whitelist: WhitelistConfig,

    /// Auth header injection for whitelisted domains.
    #[serde(default)]
    pub auth: AuthConfig,
}

/// SQL dialects accepted by the rewriter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlDialect {
    Generic,
    #[default]
    #[serde(alias = "postgres")]
    PostgreSql,
    MySql,
    Sqlite,
    Ansi,
    DuckDb,
}

impl SqlDialect {
    /// All supported dialects, in display order.
    pub const ALL: [SqlDialect; 6] = [
        SqlDialect::Generic,
        SqlDialect::PostgreSql,
        SqlDialect::MySql,
        SqlDialect::Sqlite,
        SqlDialect::Ansi,
        SqlDialect::DuckDb,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SqlDialect::Generic => "generic",
            SqlDialect::PostgreSql => "postgresql",
            SqlDialect::MySql => "mysql",
            SqlDialect::Sqlite => "sqlite",
            SqlDialect::Ansi => "ansi",
            SqlDialect::DuckDb => "duckdb",
        }
    }
}

impl fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SqlDialect {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        if lower == "postgres" {
            return Ok(SqlDialect::PostgreSql);
        }
        SqlDialect::ALL
            .into_iter()
            .find(|d| d.as_str() == lower)
            .ok_or_else(|| ConfigError::Config(format!("unknown SQL dialect: {s}")))
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl RestDbConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML content.
    ///
    /// An empty document yields the default configuration.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }

    /// Load and validate in one step.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = Self::from_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for entries the rewriter cannot honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.whitelist.validate()?;
        self.auth.validate()
    }

    /// Replace the whitelist.
    pub fn with_whitelist(mut self, whitelist: WhitelistConfig) -> Self {
        self.whitelist = whitelist;
        self
    }

    /// Replace the SQL dialect.
    pub fn with_dialect(mut self, dialect: SqlDialect) -> Self {
        self.dialect = dialect;
        self
    }
}
