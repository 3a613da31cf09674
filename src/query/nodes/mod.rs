//! Concrete query node implementations
//!
//! This module provides implementations of the `QueryNode` trait for
//! the clause types keyword search, lookups and sampling need.

mod all_docs;
mod bool_query;
mod prefix_query;
mod term_query;

pub use all_docs::AllDocsQuery;
pub use bool_query::BoolQuery;
pub use prefix_query::PrefixQuery;
pub use term_query::TermQuery;
