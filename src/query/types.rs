//! Core types for the query system

use serde::{Deserialize, Serialize};

/// Statistics collected while executing one query
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct QueryStats {
    /// Number of documents matched before truncation
    pub docs_matched: u64,
    /// Number of documents returned
    pub docs_returned: u64,
    /// Exact-term bitmaps held in the context cache afterwards
    pub cached_filters: u64,
    /// Query execution time in microseconds
    pub execution_time_us: u64,
}
