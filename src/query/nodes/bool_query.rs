//! Boolean query - conjunction of mandatory clauses

use crate::query::ast::QueryNode;
use crate::query::context::QueryContext;
use crate::Result;
use roaring::RoaringBitmap;

/// Boolean query combining mandatory clauses
///
/// - `must`: keyword clauses, all required
/// - `filter`: exact-match restrictions (year, genre), all required, cached
///
/// A query with no clauses matches every document.
#[derive(Clone, Debug, Default)]
pub struct BoolQuery {
    pub must: Vec<Box<dyn QueryNode>>,
    pub filter: Vec<Box<dyn QueryNode>>,
}

impl BoolQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a must clause
    pub fn must(mut self, query: impl QueryNode + 'static) -> Self {
        self.must.push(Box::new(query));
        self
    }

    /// Add a filter clause
    pub fn filter(mut self, query: impl QueryNode + 'static) -> Self {
        self.filter.push(Box::new(query));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.must.is_empty() && self.filter.is_empty()
    }

    pub fn clause_count(&self) -> usize {
        self.must.len() + self.filter.len()
    }

    /// Reorder clauses by estimated cost (cheapest first)
    pub fn optimize_clause_order(&mut self, ctx: &QueryContext<'_>) {
        let by_cost = |a: &Box<dyn QueryNode>, b: &Box<dyn QueryNode>| {
            a.estimate_cost(ctx)
                .partial_cmp(&b.estimate_cost(ctx))
                .unwrap_or(std::cmp::Ordering::Equal)
        };
        self.must.sort_by(by_cost);
        self.filter.sort_by(by_cost);
    }
}

impl QueryNode for BoolQuery {
    fn execute(&self, ctx: &QueryContext<'_>) -> Result<RoaringBitmap> {
        if self.is_empty() {
            return Ok(ctx.snapshot().all_docs());
        }

        let mut result: Option<RoaringBitmap> = None;

        // Filters first: cheap, selective and cached
        for query in self.filter.iter().chain(&self.must) {
            let matches = query.execute(ctx)?;
            let narrowed = match result {
                Some(r) => r & matches,
                None => matches,
            };

            if narrowed.is_empty() {
                return Ok(RoaringBitmap::new());
            }
            result = Some(narrowed);
        }

        Ok(result.unwrap_or_default())
    }

    fn estimate_cost(&self, ctx: &QueryContext<'_>) -> f64 {
        // An intersection costs no more than its most selective clause
        self.filter
            .iter()
            .chain(&self.must)
            .map(|q| q.estimate_cost(ctx))
            .fold(ctx.total_docs() as f64, f64::min)
    }

    fn query_type(&self) -> &'static str {
        "bool"
    }

    fn describe(&self) -> String {
        if self.is_empty() {
            return "*:*".to_string();
        }
        self.must
            .iter()
            .map(|q| format!("+{}", q.describe()))
            .chain(self.filter.iter().map(|q| format!("#{}", q.describe())))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn clone_box(&self) -> Box<dyn QueryNode> {
        Box::new(self.clone())
    }
}
