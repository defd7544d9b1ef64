//! Predicate pushdown from SQL into the virtual-table URI.
//!
//! Given the virtual table a statement reads from and the statement itself,
//! the rewriter moves every request-bound predicate out of the SQL and into
//! the URI:
//!
//! **Before:**
//! ```sql
//! SELECT * FROM "/reports/v2.0/ledgers"
//! WHERE QUERY_PARAMcount = 100 AND "HEADERx-clear-node-id" IN ("node-6", "node-9")
//! LIMIT 1001
//! ```
//!
//! **After:**
//! ```sql
//! SELECT * FROM "/reports/v2.0/ledgers?count=100&header=x-clear-node-id:node-6&header=x-clear-node-id:node-9" LIMIT 1001
//! ```
//!
//! Only `=` and `IN (...)` predicates inside a `WHERE` clause are eligible,
//! and only where they sit under `AND`, `OR` or parentheses. Predicates in
//! projections, `ORDER BY`, `HAVING`, join conditions or under `NOT` are left
//! alone. Running the rewrite on its own output is a no-op.

use restdb_core::{RestDbConfig, append_to_query};
use serde::Serialize;
use sqlparser::ast::{
    BinaryOperator, Expr, Query, Select, SetExpr, Statement, TableFactor, TableWithJoins, Value,
};

use crate::error::RewriteError;
use crate::parser::SqlAnalyzer;
use crate::resolver::{BindingTarget, NameResolver, PredicateBinding};
use crate::sanitizer;

/// Result of a rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewriteOutcome {
    /// The virtual table with extracted values appended.
    pub uri: String,
    /// The residual SQL, referencing `uri`.
    pub sql: String,
    /// Extracted predicates, in source order.
    pub bindings: Vec<PredicateBinding>,
}

/// Moves request-bound predicates from SQL into the virtual-table URI.
#[derive(Debug, Clone, Default)]
pub struct PredicateRewriter {
    analyzer: SqlAnalyzer,
    resolver: NameResolver,
}

impl PredicateRewriter {
    pub fn new(analyzer: SqlAnalyzer, resolver: NameResolver) -> Self {
        Self { analyzer, resolver }
    }

    pub fn from_config(config: &RestDbConfig) -> Self {
        Self::new(
            SqlAnalyzer::with_dialect(config.dialect),
            NameResolver::new(config.whitelist.clone()),
        )
    }

    /// Rewrite `sql`, which reads from the virtual table `uri`.
    ///
    /// A statement that does not read from `uri`, or has nothing to push
    /// down, comes back exactly as given.
    pub fn rewrite(&self, uri: &str, sql: &str) -> Result<RewriteOutcome, RewriteError> {
        let base = uri.trim();

        // Round-trip through text once so traversal sees canonical quoting.
        let canonical = self.analyzer.canonicalize(sql)?;
        let statements = self.analyzer.parse(&canonical)?;

        let references_uri = statements
            .iter()
            .flat_map(|stmt| self.analyzer.extract_tables(stmt))
            .any(|table| table.name == base);
        if !references_uri {
            tracing::debug!(uri = base, "Statement does not read from the virtual table");
            return Ok(RewriteOutcome {
                uri: uri.to_string(),
                sql: sql.to_string(),
                bindings: Vec::new(),
            });
        }

        let mut extractor = Extractor::new(&self.resolver);
        let statements: Vec<Statement> = statements
            .into_iter()
            .map(|stmt| extractor.statement(stmt))
            .collect();
        let bindings = extractor.bindings;

        if bindings.is_empty() {
            tracing::debug!(uri = base, "No predicates to push down");
            return Ok(RewriteOutcome {
                uri: uri.to_string(),
                sql: sql.to_string(),
                bindings,
            });
        }

        let rewritten_uri = bindings
            .iter()
            .flat_map(|b| b.values.iter().map(|v| b.target.encode_pair(v)))
            .fold(base.to_string(), |acc, pair| append_to_query(&acc, &pair));

        let residual = sanitizer::sanitize(&SqlAnalyzer::render(&statements));
        let residual = substitute_table(&residual, base, &rewritten_uri);
        let sql = self.analyzer.canonicalize(&residual)?;

        tracing::debug!(
            uri = %rewritten_uri,
            sql = %sql,
            extracted = bindings.len(),
            "Rewrote statement"
        );

        Ok(RewriteOutcome {
            uri: rewritten_uri,
            sql,
            bindings,
        })
    }
}

/// Walks a statement, pruning extracted predicates and collecting bindings.
struct Extractor<'a> {
    resolver: &'a NameResolver,
    bindings: Vec<PredicateBinding>,
}

impl<'a> Extractor<'a> {
    fn new(resolver: &'a NameResolver) -> Self {
        Self {
            resolver,
            bindings: Vec::new(),
        }
    }

    fn statement(&mut self, mut stmt: Statement) -> Statement {
        if let Statement::Query(query) = &mut stmt {
            self.query(query);
        }
        stmt
    }

    fn query(&mut self, query: &mut Query) {
        if let Some(with) = &mut query.with {
            for cte in &mut with.cte_tables {
                self.query(&mut cte.query);
            }
        }
        self.set_expr(&mut query.body);
    }

    fn set_expr(&mut self, body: &mut SetExpr) {
        match body {
            SetExpr::Select(select) => self.select(select),
            SetExpr::Query(query) => self.query(query),
            SetExpr::SetOperation { left, right, .. } => {
                self.set_expr(left);
                self.set_expr(right);
            }
            _ => {}
        }
    }

    fn select(&mut self, select: &mut Select) {
        for table_with_joins in &mut select.from {
            self.table_with_joins(table_with_joins);
        }
        select.selection = select
            .selection
            .take()
            .and_then(|expr| self.prune(expr, true));
    }

    fn table_with_joins(&mut self, table_with_joins: &mut TableWithJoins) {
        self.table_factor(&mut table_with_joins.relation);
        for join in &mut table_with_joins.joins {
            self.table_factor(&mut join.relation);
        }
    }

    fn table_factor(&mut self, table_factor: &mut TableFactor) {
        match table_factor {
            TableFactor::Derived { subquery, .. } => self.query(subquery),
            TableFactor::NestedJoin {
                table_with_joins, ..
            } => self.table_with_joins(table_with_joins),
            _ => {}
        }
    }

    /// Rebuild `expr` without extracted predicates.
    ///
    /// Returns `None` when nothing of the expression remains.
    fn prune(&mut self, expr: Expr, in_where: bool) -> Option<Expr> {
        if in_where {
            if let Some(binding) = self.extract(&expr) {
                tracing::debug!(
                    target = %binding.target,
                    values = ?binding.values,
                    "Pushed predicate into virtual table"
                );
                self.bindings.push(binding);
                return None;
            }
        }

        match expr {
            Expr::BinaryOp {
                left,
                op: op @ (BinaryOperator::And | BinaryOperator::Or),
                right,
            } => {
                let left = self.prune(*left, in_where);
                let right = self.prune(*right, in_where);
                match (left, right) {
                    (Some(left), Some(right)) => Some(Expr::BinaryOp {
                        left: Box::new(left),
                        op,
                        right: Box::new(right),
                    }),
                    (Some(remaining), None) | (None, Some(remaining)) => Some(remaining),
                    (None, None) => None,
                }
            }
            Expr::Nested(inner) => self
                .prune(*inner, in_where)
                .map(|inner| Expr::Nested(Box::new(inner))),
            // Negated predicates cannot be expressed as request parameters.
            Expr::UnaryOp { op, expr } => self
                .prune(*expr, false)
                .map(|expr| Expr::UnaryOp {
                    op,
                    expr: Box::new(expr),
                }),
            Expr::Subquery(mut query) => {
                self.query(&mut query);
                Some(Expr::Subquery(query))
            }
            Expr::Exists {
                mut subquery,
                negated,
            } => {
                self.query(&mut subquery);
                Some(Expr::Exists { subquery, negated })
            }
            other => Some(other),
        }
    }

    fn extract(&self, expr: &Expr) -> Option<PredicateBinding> {
        match expr {
            Expr::BinaryOp {
                left,
                op: BinaryOperator::Eq,
                right,
            } => Some(PredicateBinding {
                target: self.resolve(left)?,
                values: vec![literal_text(right)],
            }),
            Expr::InList {
                expr,
                list,
                negated: false,
            } => Some(PredicateBinding {
                target: self.resolve(expr)?,
                values: list.iter().map(literal_text).collect(),
            }),
            _ => None,
        }
    }

    fn resolve(&self, column: &Expr) -> Option<BindingTarget> {
        match column {
            Expr::Identifier(ident) => self.resolver.resolve(&ident.value),
            _ => None,
        }
    }
}

/// The value a predicate operand contributes to the URI, without SQL quoting.
fn literal_text(expr: &Expr) -> String {
    match expr {
        Expr::Value(value) => match &value.value {
            Value::SingleQuotedString(s)
            | Value::DoubleQuotedString(s)
            | Value::TripleSingleQuotedString(s)
            | Value::TripleDoubleQuotedString(s)
            | Value::EscapedStringLiteral(s)
            | Value::UnicodeStringLiteral(s)
            | Value::NationalStringLiteral(s)
            | Value::SingleQuotedByteStringLiteral(s)
            | Value::DoubleQuotedByteStringLiteral(s)
            | Value::TripleSingleQuotedByteStringLiteral(s)
            | Value::TripleDoubleQuotedByteStringLiteral(s)
            | Value::SingleQuotedRawStringLiteral(s)
            | Value::DoubleQuotedRawStringLiteral(s)
            | Value::TripleSingleQuotedRawStringLiteral(s)
            | Value::TripleDoubleQuotedRawStringLiteral(s) => s.clone(),
            Value::DollarQuotedString(dollar) => dollar.value.clone(),
            other => other.to_string(),
        },
        Expr::Identifier(ident) => ident.value.clone(),
        other => other.to_string().trim_matches('"').to_string(),
    }
}

/// Point quoted references to the virtual table `from` at `to`.
fn substitute_table(sql: &str, from: &str, to: &str) -> String {
    if from == to {
        return sql.to_string();
    }
    ['"', '`'].into_iter().fold(sql.to_string(), |acc, quote| {
        acc.replace(&quoted(from, quote), &quoted(to, quote))
    })
}

fn quoted(name: &str, quote: char) -> String {
    let escaped = name.replace(quote, &format!("{quote}{quote}"));
    format!("{quote}{escaped}{quote}")
}
