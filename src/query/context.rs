//! Query execution context
//!
//! The `QueryContext` gives query nodes access to one acquired snapshot and
//! caches exact-term bitmaps for the duration of a single query.

use crate::error::Result;
use crate::models::Field;
use crate::segment::IndexSnapshot;
use parking_lot::RwLock;
use roaring::RoaringBitmap;
use std::collections::HashMap;

/// Filter result cache, keyed by the clause's canonical form
pub type FilterCache = RwLock<HashMap<String, RoaringBitmap>>;

/// Query execution context over one snapshot
pub struct QueryContext<'a> {
    snapshot: &'a IndexSnapshot,
    /// Upper bound on terms a prefix clause may expand to
    max_expansions: usize,
    filter_cache: FilterCache,
}

impl<'a> QueryContext<'a> {
    pub fn new(snapshot: &'a IndexSnapshot, max_expansions: usize) -> Self {
        Self {
            snapshot,
            max_expansions,
            filter_cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn snapshot(&self) -> &'a IndexSnapshot {
        self.snapshot
    }

    /// Documents visible to this query
    pub fn total_docs(&self) -> u32 {
        self.snapshot.doc_count()
    }

    pub fn max_expansions(&self) -> usize {
        self.max_expansions
    }

    pub fn doc_frequency(&self, field: Field, term: &str) -> u64 {
        self.snapshot.doc_frequency(field, term)
    }

    /// Get or compute a cached filter result
    pub fn get_or_cache_filter<F>(&self, cache_key: &str, compute: F) -> Result<RoaringBitmap>
    where
        F: FnOnce() -> Result<RoaringBitmap>,
    {
        if let Some(cached) = self.filter_cache.read().get(cache_key) {
            return Ok(cached.clone());
        }

        let result = compute()?;
        self.filter_cache
            .write()
            .insert(cache_key.to_string(), result.clone());
        Ok(result)
    }

    pub fn cached_filters(&self) -> usize {
        self.filter_cache.read().len()
    }
}
