//! Abstract Syntax Tree for query representation
//!
//! Every query type implements `QueryNode`, giving a uniform interface for
//! execution against a snapshot and cost-based clause ordering.

use crate::Result;
use roaring::RoaringBitmap;
use std::fmt::Debug;

use super::context::QueryContext;

/// Core trait for all query nodes in the AST
///
/// Nodes are executed against a `QueryContext` to produce the set of
/// matching snapshot docnos. Ordering of results is the executor's job.
pub trait QueryNode: Send + Sync + Debug {
    /// Execute the query and return matching docnos as a bitmap
    fn execute(&self, ctx: &QueryContext<'_>) -> Result<RoaringBitmap>;

    /// Estimate the execution cost of this query
    ///
    /// Lower costs are executed first inside boolean queries so empty
    /// intersections are detected early.
    fn estimate_cost(&self, ctx: &QueryContext<'_>) -> f64;

    /// Get the query type name for debugging and logging
    fn query_type(&self) -> &'static str;

    /// Compact textual form, e.g. `+keywords:the +keywords:exam*`
    fn describe(&self) -> String;

    /// Clone this query node into a boxed trait object
    fn clone_box(&self) -> Box<dyn QueryNode>;
}

impl Clone for Box<dyn QueryNode> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
