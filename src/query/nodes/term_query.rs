//! Term query - exact match on a field

use crate::models::Field;
use crate::query::ast::QueryNode;
use crate::query::context::QueryContext;
use crate::Result;
use roaring::RoaringBitmap;

/// Query that matches documents containing an exact term in a field
///
/// Looks the term up in each segment's dictionary and unions the postings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TermQuery {
    pub field: Field,
    pub term: String,
}

impl TermQuery {
    pub fn new(field: Field, term: impl Into<String>) -> Self {
        Self {
            field,
            term: term.into(),
        }
    }

    /// Get the cache key for this term
    pub fn cache_key(&self) -> String {
        format!("term:{}:{}", self.field, self.term)
    }
}

impl QueryNode for TermQuery {
    fn execute(&self, ctx: &QueryContext<'_>) -> Result<RoaringBitmap> {
        ctx.get_or_cache_filter(&self.cache_key(), || {
            Ok(ctx.snapshot().term_docs(self.field, &self.term))
        })
    }

    fn estimate_cost(&self, ctx: &QueryContext<'_>) -> f64 {
        ctx.doc_frequency(self.field, &self.term) as f64
    }

    fn query_type(&self) -> &'static str {
        "term"
    }

    fn describe(&self) -> String {
        format!("{}:{}", self.field, self.term)
    }

    fn clone_box(&self) -> Box<dyn QueryNode> {
        Box::new(self.clone())
    }
}
