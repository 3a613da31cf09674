//! Query executor for running queries against a snapshot
//!
//! Matching is bitmap-based; ordering uses the precomputed sort-key columns.
//! Ties on the sort key fall back to docno so results are deterministic.

use crate::models::{SortOrder, Track};
use crate::query::ast::QueryNode;
use crate::query::context::QueryContext;
use crate::query::types::QueryStats;
use crate::segment::DocNo;
use crate::Result;
use roaring::RoaringBitmap;
use std::collections::BinaryHeap;
use std::time::Instant;

/// Query execution result
#[derive(Debug)]
pub struct QueryResult {
    /// Matching tracks in sort order
    pub hits: Vec<Track>,
    /// Total number of matching documents
    pub total_hits: u64,
    pub stats: QueryStats,
}

/// Query executor for running queries
pub struct QueryExecutor;

impl QueryExecutor {
    /// Execute a query and return up to `top_k` tracks ordered by `sort`
    pub fn execute(
        query: &dyn QueryNode,
        ctx: &QueryContext<'_>,
        sort: SortOrder,
        top_k: usize,
    ) -> Result<QueryResult> {
        let start = Instant::now();

        let matches = query.execute(ctx)?;
        let total_hits = matches.len();
        let hits = Self::collect_sorted(ctx, &matches, sort, top_k);

        let stats = QueryStats {
            docs_matched: total_hits,
            docs_returned: hits.len() as u64,
            cached_filters: ctx.cached_filters() as u64,
            execution_time_us: start.elapsed().as_micros() as u64,
        };

        Ok(QueryResult {
            hits,
            total_hits,
            stats,
        })
    }

    /// Execute a query and return only the matching docnos
    pub fn matches(query: &dyn QueryNode, ctx: &QueryContext<'_>) -> Result<RoaringBitmap> {
        query.execute(ctx)
    }

    /// Keep the `top_k` smallest `(sort key, docno)` pairs, then resolve tracks
    fn collect_sorted(
        ctx: &QueryContext<'_>,
        matches: &RoaringBitmap,
        sort: SortOrder,
        top_k: usize,
    ) -> Vec<Track> {
        if matches.is_empty() || top_k == 0 {
            return Vec::new();
        }

        let snapshot = ctx.snapshot();
        let capacity = top_k.min(matches.len() as usize);

        // Max-heap: the largest retained key sits on top and is evicted first
        let mut heap: BinaryHeap<(&str, u32)> = BinaryHeap::with_capacity(capacity + 1);
        for docno in matches.iter() {
            let key = snapshot.sort_key(sort, DocNo(docno)).unwrap_or_default();
            if heap.len() < top_k {
                heap.push((key, docno));
            } else if let Some(&top) = heap.peek() {
                if (key, docno) < top {
                    heap.pop();
                    heap.push((key, docno));
                }
            }
        }

        heap.into_sorted_vec()
            .into_iter()
            .filter_map(|(_, docno)| snapshot.track(DocNo(docno)).cloned())
            .collect()
    }
}
