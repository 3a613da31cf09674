//! Query construction and execution
//!
//! - Term queries (exact match on an indexed field)
//! - Prefix queries (search-as-you-type on the last keyword)
//! - Boolean queries (conjunction of must and filter clauses)
//! - All-docs queries (the `*` wildcard, sampling without a year)
//!
//! Results are ordered by precomputed sort keys, never by relevance.

pub mod ast;
pub mod builder;
pub mod context;
pub mod engine;
pub mod executor;
pub mod nodes;
pub mod types;

pub use ast::QueryNode;
pub use builder::{build_keyword_query, with_filters};
pub use context::QueryContext;
pub use engine::QueryEngine;
pub use executor::{QueryExecutor, QueryResult};
pub use nodes::{AllDocsQuery, BoolQuery, PrefixQuery, TermQuery};
pub use types::QueryStats;
