//! Read-side entry point: keyword search and record lookups.
//!
//! Every operation acquires its own snapshot and releases it when done, so a
//! concurrent rebuild never changes results mid-query.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::QueryConfig;
use crate::error::Result;
use crate::models::{Field, SearchFilters, SortOrder, Track};
use crate::query::ast::QueryNode;
use crate::query::builder::build_keyword_query;
use crate::query::context::QueryContext;
use crate::query::executor::{QueryExecutor, QueryResult};
use crate::query::nodes::{BoolQuery, TermQuery};
use crate::segment::IndexStore;

/// Executes searches and lookups against an [`IndexStore`]
pub struct QueryEngine {
    store: Arc<IndexStore>,
    config: QueryConfig,
}

impl QueryEngine {
    pub fn new(store: Arc<IndexStore>, config: QueryConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Keyword search; errors are logged and yield an empty list
    pub fn search(&self, keywords: Option<&str>, filters: &SearchFilters, sort: SortOrder) -> Vec<Track> {
        match self.try_search(keywords, filters, sort) {
            Ok(hits) => hits,
            Err(e) => {
                warn!("Search for {:?} failed: {}", keywords, e);
                Vec::new()
            }
        }
    }

    /// Keyword search, at most `max_hits` tracks ordered by `sort`
    pub fn try_search(
        &self,
        keywords: Option<&str>,
        filters: &SearchFilters,
        sort: SortOrder,
    ) -> Result<Vec<Track>> {
        let Some(query) = build_keyword_query(keywords, filters) else {
            return Ok(Vec::new());
        };

        let result = self.run(query, sort, self.config.max_hits)?;
        debug!(
            "Search {:?} matched {} tracks in {}us",
            keywords, result.total_hits, result.stats.execution_time_us
        );
        Ok(result.hits)
    }

    /// The track with this id, if any
    pub fn get_by_id(&self, track_id: &str) -> Result<Option<Track>> {
        if track_id.trim().is_empty() {
            return Ok(None);
        }

        let query = BoolQuery::new().must(TermQuery::new(Field::TrackId, track_id));
        let result = self.run(query, SortOrder::Default, 1)?;
        Ok(result.hits.into_iter().next())
    }

    /// Every track of an album, in default order
    pub fn get_by_album_id(&self, album_id: &str) -> Result<Vec<Track>> {
        if album_id.trim().is_empty() {
            return Ok(Vec::new());
        }

        let query = BoolQuery::new().must(TermQuery::new(Field::AlbumId, album_id));
        let lease = self.store.lease();
        let ctx = QueryContext::new(&lease, self.config.prefix_max_expansions);
        Ok(QueryExecutor::execute(&query, &ctx, SortOrder::Default, usize::MAX)?.hits)
    }

    fn run(&self, mut query: BoolQuery, sort: SortOrder, top_k: usize) -> Result<QueryResult> {
        let lease = self.store.lease();
        let ctx = QueryContext::new(&lease, self.config.prefix_max_expansions);
        query.optimize_clause_order(&ctx);
        QueryExecutor::execute(&query as &dyn QueryNode, &ctx, sort, top_k)
    }
}
