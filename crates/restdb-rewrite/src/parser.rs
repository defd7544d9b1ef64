//! SQL parsing and analysis.

use restdb_core::SqlDialect;
use sqlparser::ast::{
    ObjectName, ObjectNamePart, Query, SetExpr, Statement, TableFactor, TableWithJoins,
};
use sqlparser::dialect::{
    AnsiDialect, DuckDbDialect, GenericDialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect,
};
use sqlparser::parser::Parser;

use crate::error::RewriteError;

/// Parses and re-serializes SQL in a configured dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlAnalyzer {
    dialect: SqlDialect,
}

impl SqlAnalyzer {
    /// Create an analyzer for the default (PostgreSQL) dialect.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dialect(dialect: SqlDialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> SqlDialect {
        self.dialect
    }

    /// Parse a SQL string into statements.
    pub fn parse(&self, sql: &str) -> Result<Vec<Statement>, RewriteError> {
        let parsed = match self.dialect {
            SqlDialect::Generic => Parser::parse_sql(&GenericDialect {}, sql),
            SqlDialect::PostgreSql => Parser::parse_sql(&PostgreSqlDialect {}, sql),
            SqlDialect::MySql => Parser::parse_sql(&MySqlDialect {}, sql),
            SqlDialect::Sqlite => Parser::parse_sql(&SQLiteDialect {}, sql),
            SqlDialect::Ansi => Parser::parse_sql(&AnsiDialect {}, sql),
            SqlDialect::DuckDb => Parser::parse_sql(&DuckDbDialect {}, sql),
        };
        parsed.map_err(|e| RewriteError::ParseError(e.to_string()))
    }

    /// Parse and re-serialize, normalising whitespace, keyword case and quoting.
    pub fn canonicalize(&self, sql: &str) -> Result<String, RewriteError> {
        let statements = self.parse(sql)?;
        if statements.is_empty() {
            return Err(RewriteError::EmptyStatement);
        }
        Ok(Self::render(&statements))
    }

    /// Serialize statements back to SQL text.
    pub fn render(statements: &[Statement]) -> String {
        statements
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Extract table references from a statement, including derived tables.
    pub fn extract_tables(&self, stmt: &Statement) -> Vec<TableReference> {
        let mut tables = Vec::new();
        if let Statement::Query(query) = stmt {
            self.visit_query(query, &mut tables);
        }
        tables
    }

    fn visit_query(&self, query: &Query, tables: &mut Vec<TableReference>) {
        if let Some(with) = &query.with {
            for cte in &with.cte_tables {
                self.visit_query(&cte.query, tables);
            }
        }
        self.visit_set_expr(&query.body, tables);
    }

    fn visit_set_expr(&self, body: &SetExpr, tables: &mut Vec<TableReference>) {
        match body {
            SetExpr::Select(select) => {
                for table_with_joins in &select.from {
                    self.visit_table_with_joins(table_with_joins, tables);
                }
            }
            SetExpr::Query(query) => self.visit_query(query, tables),
            SetExpr::SetOperation { left, right, .. } => {
                self.visit_set_expr(left, tables);
                self.visit_set_expr(right, tables);
            }
            _ => {}
        }
    }

    fn visit_table_with_joins(
        &self,
        table_with_joins: &TableWithJoins,
        tables: &mut Vec<TableReference>,
    ) {
        self.visit_table_factor(&table_with_joins.relation, tables);
        for join in &table_with_joins.joins {
            self.visit_table_factor(&join.relation, tables);
        }
    }

    fn visit_table_factor(&self, table_factor: &TableFactor, tables: &mut Vec<TableReference>) {
        match table_factor {
            TableFactor::Table { name, alias, .. } => tables.push(TableReference {
                name: unquoted_name(name),
                alias: alias.as_ref().map(|a| a.name.value.clone()),
            }),
            TableFactor::Derived { subquery, .. } => self.visit_query(subquery, tables),
            TableFactor::NestedJoin {
                table_with_joins, ..
            } => self.visit_table_with_joins(table_with_joins, tables),
            _ => {}
        }
    }
}

/// Dotted table name with identifier quotes removed.
fn unquoted_name(name: &ObjectName) -> String {
    name.0
        .iter()
        .map(|part| match part {
            ObjectNamePart::Identifier(ident) => ident.value.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// A reference to a table in a SQL statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableReference {
    /// The table name, unquoted.
    pub name: String,
    /// Optional alias.
    pub alias: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_simple_select() {
        let analyzer = SqlAnalyzer::new();
        let stmts = analyzer.parse("SELECT * FROM users").unwrap();
        assert_eq!(stmts.len(), 1);

        let tables = analyzer.extract_tables(&stmts[0]);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].name, "users");
    }

    #[test]
    fn test_quoted_uri_table() {
        let analyzer = SqlAnalyzer::new();
        let stmts = analyzer
            .parse(r#"SELECT * FROM (SELECT a FROM "/reports/v2.0/ledgers") AS virtual_table"#)
            .unwrap();

        let tables = analyzer.extract_tables(&stmts[0]);
        assert_eq!(
            tables,
            vec![TableReference {
                name: "/reports/v2.0/ledgers".to_string(),
                alias: None,
            }]
        );
    }

    #[test]
    fn test_parse_join() {
        let analyzer = SqlAnalyzer::new();
        let stmts = analyzer
            .parse("SELECT * FROM orders o JOIN users u ON o.user_id = u.id")
            .unwrap();

        let tables = analyzer.extract_tables(&stmts[0]);
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].alias, Some("o".to_string()));
        assert_eq!(tables[1].name, "users");
    }

    #[test]
    fn test_canonicalize() {
        let analyzer = SqlAnalyzer::new();
        let sql = analyzer
            .canonicalize("select *\n  from \"/ledgers\"\n where a = 1\n limit 5")
            .unwrap();
        assert_eq!(sql, r#"SELECT * FROM "/ledgers" WHERE a = 1 LIMIT 5"#);
        assert_eq!(analyzer.canonicalize(&sql).unwrap(), sql);
    }

    #[test]
    fn test_parse_error() {
        let analyzer = SqlAnalyzer::new();
        assert!(matches!(
            analyzer.parse("SELECT * FROM t WHERE"),
            Err(RewriteError::ParseError(_))
        ));
        assert!(matches!(
            analyzer.canonicalize(""),
            Err(RewriteError::EmptyStatement)
        ));
    }

    #[test]
    fn test_dialects_parse_basic_select() {
        for dialect in SqlDialect::ALL {
            let analyzer = SqlAnalyzer::with_dialect(dialect);
            assert_eq!(analyzer.dialect(), dialect);
            assert!(analyzer.parse("SELECT a FROM t WHERE b = 1 LIMIT 2").is_ok());
        }
    }
}
