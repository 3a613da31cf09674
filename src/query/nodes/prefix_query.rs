//! Prefix query - matches terms starting with a prefix
//!
//! The trailing token of a keyword search becomes a prefix query so results
//! update while the user is still typing.
//!
//! # Example
//!
//! ```rust
//! use tuneindex::models::Field;
//! use tuneindex::query::PrefixQuery;
//!
//! // Matches "example", "examples", "exam", ...
//! let query = PrefixQuery::new(Field::Keywords, "exam");
//! ```

use crate::models::Field;
use crate::query::ast::QueryNode;
use crate::query::context::QueryContext;
use crate::Result;
use roaring::RoaringBitmap;
use tracing::debug;

/// Query that matches terms starting with a prefix
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrefixQuery {
    pub field: Field,
    pub prefix: String,
    /// Overrides the context's expansion limit when set
    pub max_expansions: Option<usize>,
}

impl PrefixQuery {
    pub fn new(field: Field, prefix: impl Into<String>) -> Self {
        Self {
            field,
            prefix: prefix.into(),
            max_expansions: None,
        }
    }

    /// Set the maximum number of terms to expand
    pub fn with_max_expansions(mut self, max_expansions: usize) -> Self {
        self.max_expansions = Some(max_expansions);
        self
    }

    pub fn cache_key(&self) -> String {
        format!("prefix:{}:{}", self.field, self.prefix)
    }
}

impl QueryNode for PrefixQuery {
    fn execute(&self, ctx: &QueryContext<'_>) -> Result<RoaringBitmap> {
        let limit = self.max_expansions.unwrap_or_else(|| ctx.max_expansions());
        ctx.get_or_cache_filter(&self.cache_key(), || {
            let (docs, truncated) = ctx.snapshot().prefix_docs(self.field, &self.prefix, limit);
            if truncated {
                debug!(
                    "Prefix '{}' on {} expanded past {} terms, results truncated",
                    self.prefix, self.field, limit
                );
            }
            Ok(docs)
        })
    }

    fn estimate_cost(&self, ctx: &QueryContext<'_>) -> f64 {
        // Short prefixes expand to more terms
        let total = ctx.total_docs() as f64;
        total / (self.prefix.chars().count().max(1) as f64)
    }

    fn query_type(&self) -> &'static str {
        "prefix"
    }

    fn describe(&self) -> String {
        format!("{}:{}*", self.field, self.prefix)
    }

    fn clone_box(&self) -> Box<dyn QueryNode> {
        Box::new(self.clone())
    }
}
