//! `restdb check` command implementation.
//!
//! Validates a configuration file:
//! - YAML parsing and structural validation
//! - Warnings for settings that parse but will not do anything

use anyhow::{Result, bail};
use restdb_core::RestDbConfig;
use std::env;
use std::fmt;
use std::path::Path;

/// Severity level for check results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "WARN"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// A single check finding.
#[derive(Debug, Clone)]
pub struct CheckFinding {
    pub severity: Severity,
    /// Category of the check that produced this finding.
    pub category: &'static str,
    pub message: String,
}

impl CheckFinding {
    fn error(category: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            category,
            message: message.into(),
        }
    }

    fn warning(category: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            category,
            message: message.into(),
        }
    }
}

impl fmt::Display for CheckFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.category, self.message)
    }
}

/// Collected findings for one configuration file.
#[derive(Debug, Default)]
pub struct CheckResult {
    pub findings: Vec<CheckFinding>,
}

impl CheckResult {
    pub fn has_errors(&self) -> bool {
        self.findings.iter().any(|f| f.severity == Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Warning)
            .count()
    }

    fn print_summary(&self, path: &Path) {
        println!("Checked {}", path.display());
        for finding in &self.findings {
            println!("  {finding}");
        }
        if self.has_errors() {
            println!("✘ Configuration has errors that must be fixed.");
        } else if self.findings.is_empty() {
            println!("✔ All checks passed!");
        } else {
            println!("✔ Configuration is valid ({} warning(s)).", self.warning_count());
        }
    }
}

/// Validate `path` and print a summary; fails when errors were found.
pub fn run(path: &Path) -> Result<()> {
    let result = check(path);
    result.print_summary(path);
    if result.has_errors() {
        bail!("{} is invalid", path.display());
    }
    Ok(())
}

pub fn check(path: &Path) -> CheckResult {
    let mut result = CheckResult::default();

    let config = match RestDbConfig::from_file(path) {
        Ok(config) => config,
        Err(e) => {
            result.findings.push(CheckFinding::error("parse", e.to_string()));
            return result;
        }
    };

    if let Err(e) = config.validate() {
        result.findings.push(CheckFinding::error("validate", e.to_string()));
    }
    result.findings.extend(warnings(&config));
    result
}

fn warnings(config: &RestDbConfig) -> Vec<CheckFinding> {
    let mut findings = Vec::new();

    if config.whitelist.is_empty() {
        findings.push(CheckFinding::warning(
            "whitelist",
            "no whitelisted names; only QUERY_PARAM/HEADER tagged predicates will be pushed down",
        ));
    }

    let has_trusted_hosts = !config.auth.whitelisted_domains.is_empty()
        || env::var(&config.auth.whitelisted_domains_env).is_ok_and(|v| !v.trim().is_empty());
    if has_trusted_hosts && config.auth.token().is_none() {
        findings.push(CheckFinding::warning(
            "auth",
            format!(
                "trusted hosts are configured but {} does not hold a <header>=<value> token",
                config.auth.token_env
            ),
        ));
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn check_yaml(yaml: &str) -> CheckResult {
        let dir = tempdir().unwrap();
        let path = dir.path().join("restdb.yaml");
        fs::write(&path, yaml).unwrap();
        check(&path)
    }

    #[test]
    fn test_valid_config() {
        let result = check_yaml(
            "whitelist:\n  headers:\n    org_id: x-cleartax-orgunit\n  query_params:\n    node_ids: nodeIds\n",
        );
        assert!(!result.has_errors());
        assert_eq!(result.warning_count(), 0);
    }

    #[test]
    fn test_empty_whitelist_warns() {
        let result = check_yaml("dialect: generic\n");
        assert!(!result.has_errors());
        assert_eq!(result.warning_count(), 1);
        assert_eq!(result.findings[0].category, "whitelist");
    }

    #[test]
    fn test_conflicting_whitelist_is_error() {
        let result = check_yaml(
            "whitelist:\n  headers:\n    org_id: x-org\n  query_params:\n    org_id: orgId\n",
        );
        assert!(result.has_errors());
    }

    #[test]
    fn test_trusted_host_without_token_warns() {
        let result = check_yaml(
            "whitelist:\n  headers:\n    org_id: x-org\nauth:\n  token_env: RESTDB_CHECK_TEST_UNSET_TOKEN\n  whitelisted_domains: [api.example.com]\n",
        );
        assert!(!result.has_errors());
        assert!(result.findings.iter().any(|f| f.category == "auth"));
    }

    #[test]
    fn test_unparseable_file() {
        let result = check_yaml("dialect: [not, a, dialect]\n");
        assert!(result.has_errors());
        assert_eq!(result.findings[0].category, "parse");

        let dir = tempdir().unwrap();
        assert!(run(&dir.path().join("missing.yaml")).is_err());
    }
}
