//! # restdb-rewrite
//!
//! SQL predicate pushdown for REST virtual tables.
//!
//! This crate provides functionality to:
//! - Parse SQL statements using `sqlparser`
//! - Resolve predicate columns to query parameters or request headers
//! - Move those predicates out of the SQL and into the virtual-table URI
//! - Describe the HTTP request a virtual table stands for
//!
//! ## How It Works
//!
//! **Before (from the query engine):**
//! ```sql
//! SELECT * FROM "/ledgers" WHERE org_id = 'o1' AND amount > 10
//! ```
//!
//! **After:**
//! ```sql
//! SELECT * FROM "/ledgers?header=x-cleartax-orgunit:o1" WHERE amount > 10
//! ```
//!
//! ## Predicate Names
//!
//! | Column                  | Pushed down as              |
//! |-------------------------|-----------------------------|
//! | `QUERY_PARAMpage`       | query parameter `page`      |
//! | `"HEADERx-node-id"`     | header `x-node-id`          |
//! | whitelisted short name  | its canonical header/param  |
//! | anything else           | stays in the SQL            |

pub mod adapter;
pub mod error;
pub mod parser;
pub mod resolver;
pub mod rewriter;
pub mod sanitizer;

pub use adapter::{EndpointRequest, HttpMethod, RestAdapter};
pub use error::RewriteError;
pub use parser::{SqlAnalyzer, TableReference};
pub use resolver::{BindingTarget, HEADER_TAG, NameResolver, PredicateBinding, QUERY_PARAM_TAG};
pub use rewriter::{PredicateRewriter, RewriteOutcome};
