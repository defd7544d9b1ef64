//! `restdb rewrite` - push predicates from SQL into the virtual table.

use restdb_rewrite::{RestAdapter, RewriteOutcome};
use std::path::Path;

use super::{load_config, print_json};

/// Rewrite `sql` against `uri` and print the outcome as JSON.
///
/// Unlike the adapter boundary, parse failures are reported to the user.
pub fn run(uri: &str, sql: &str, config: Option<&Path>) -> anyhow::Result<()> {
    let outcome = rewrite(uri, sql, config)?;
    print_json(&outcome)
}

fn rewrite(uri: &str, sql: &str, config: Option<&Path>) -> anyhow::Result<RewriteOutcome> {
    let adapter = RestAdapter::new(&load_config(config)?);
    Ok(adapter.rewrite(uri, sql)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_rewrite_with_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("restdb.yaml");
        fs::write(
            &path,
            "whitelist:\n  headers:\n    org_id: x-cleartax-orgunit\n",
        )
        .unwrap();

        let outcome = rewrite(
            "/ledgers",
            r#"SELECT * FROM "/ledgers" WHERE org_id = 'o1'"#,
            Some(&path),
        )
        .unwrap();
        assert_eq!(outcome.uri, "/ledgers?header=x-cleartax-orgunit:o1");
        assert_eq!(
            outcome.sql,
            r#"SELECT * FROM "/ledgers?header=x-cleartax-orgunit:o1""#
        );
    }

    #[test]
    fn test_rewrite_reports_parse_errors() {
        assert!(rewrite("/ledgers", "SELECT * FROM t WHERE", None).is_err());
    }

    #[test]
    fn test_missing_config_file() {
        let dir = tempdir().unwrap();
        let err = rewrite("/a", "SELECT 1", Some(&dir.path().join("missing.yaml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to load configuration"));
    }
}
