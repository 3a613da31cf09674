//! All documents query - matches every document in the snapshot

use crate::query::ast::QueryNode;
use crate::query::context::QueryContext;
use crate::Result;
use roaring::RoaringBitmap;

/// Query that matches all documents
#[derive(Clone, Debug, Default)]
pub struct AllDocsQuery;

impl AllDocsQuery {
    pub fn new() -> Self {
        Self
    }
}

impl QueryNode for AllDocsQuery {
    fn execute(&self, ctx: &QueryContext<'_>) -> Result<RoaringBitmap> {
        Ok(ctx.snapshot().all_docs())
    }

    fn estimate_cost(&self, ctx: &QueryContext<'_>) -> f64 {
        ctx.total_docs() as f64
    }

    fn query_type(&self) -> &'static str {
        "all_docs"
    }

    fn describe(&self) -> String {
        "*:*".to_string()
    }

    fn clone_box(&self) -> Box<dyn QueryNode> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::nodes::test_support::sample_snapshot;
    use crate::segment::IndexSnapshot;

    #[test]
    fn test_all_docs_query() {
        let snapshot = sample_snapshot();
        let ctx = QueryContext::new(&snapshot, 10);

        let result = AllDocsQuery::new().execute(&ctx).unwrap();
        assert_eq!(result.len(), 3);
        assert_eq!(AllDocsQuery.estimate_cost(&ctx), 3.0);
        assert_eq!(AllDocsQuery.query_type(), "all_docs");
    }

    #[test]
    fn test_all_docs_on_empty_snapshot() {
        let snapshot = IndexSnapshot::empty();
        let ctx = QueryContext::new(&snapshot, 10);
        assert!(AllDocsQuery.execute(&ctx).unwrap().is_empty());
    }
}
