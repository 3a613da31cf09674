//! The catalog facade: one index directory, its writer, and every read path.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::CatalogConfig;
use crate::error::Result;
use crate::facets::{FacetCache, FacetEnumerator};
use crate::indexer::{Indexer, RebuildStats, TrackSource};
use crate::models::{Field, SearchFilters, SearchRequest, SortOrder, Track};
use crate::query::QueryEngine;
use crate::sampler::SamplerEngine;
use crate::segment::IndexStore;

/// Searchable track catalog backed by an on-disk index.
///
/// Open once at startup, call [`TrackCatalog::prepare`] before querying and
/// [`TrackCatalog::close`] on shutdown.
pub struct TrackCatalog {
    config: CatalogConfig,
    store: Arc<IndexStore>,
    indexer: Indexer,
    queries: QueryEngine,
    sampler: SamplerEngine,
    facets: FacetEnumerator,
    facet_cache: FacetCache,
}

impl TrackCatalog {
    /// Open the index directory named by `config`.
    ///
    /// Fails with [`crate::CatalogError::LockHeld`] when another instance owns it.
    pub fn open(config: CatalogConfig) -> Result<Self> {
        let store = Arc::new(IndexStore::open(&config.index_dir)?);
        let catalog = Self {
            indexer: Indexer::new(store.clone()),
            queries: QueryEngine::new(store.clone(), config.query.clone()),
            sampler: SamplerEngine::new(store.clone(), config.sampler.clone()),
            facets: FacetEnumerator::new(store.clone()),
            facet_cache: FacetCache::new(),
            store,
            config,
        };
        catalog.facet_cache.refresh(&catalog.facets);
        Ok(catalog)
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<IndexStore> {
        &self.store
    }

    /// Rebuild from `source` if the index is invalid or was built from different input.
    ///
    /// Returns `None` when the existing index is kept.
    pub fn prepare(&self, source: &mut dyn TrackSource) -> Result<Option<RebuildStats>> {
        if !self.store.is_valid() {
            info!("Index at {} is missing or invalid", self.config.index_dir.display());
            return self.rebuild(source).map(Some);
        }

        let recorded = self.store.source_fingerprint();
        let current = source.fingerprint();
        if current.is_some() && current != recorded {
            info!(
                "Source fingerprint changed ({:?} -> {:?}), rebuilding",
                recorded, current
            );
            return self.rebuild(source).map(Some);
        }

        info!("Index is current ({} tracks)", self.store.doc_count());
        Ok(None)
    }

    /// Replace the index with the contents of `source` and refresh cached facets
    pub fn rebuild(&self, source: &mut dyn TrackSource) -> Result<RebuildStats> {
        self.indexer
            .rebuild_all_with(source, || self.facet_cache.refresh(&self.facets))
    }

    pub fn search(&self, keywords: Option<&str>, filters: &SearchFilters, sort: SortOrder) -> Vec<Track> {
        self.queries.search(keywords, filters, sort)
    }

    pub fn search_request(&self, request: &SearchRequest) -> Vec<Track> {
        self.queries
            .search(request.keywords.as_deref(), &request.filters, request.sort)
    }

    pub fn get_by_id(&self, track_id: &str) -> Result<Option<Track>> {
        self.queries.get_by_id(track_id)
    }

    pub fn get_by_album_id(&self, album_id: &str) -> Result<Vec<Track>> {
        self.queries.get_by_album_id(album_id)
    }

    pub fn shuffled_playlist(&self, size: usize, year: Option<i32>) -> Vec<Track> {
        self.sampler.shuffled_playlist(size, year)
    }

    pub fn distinct_values(&self, field: Field) -> Vec<String> {
        self.facets.distinct_values(field)
    }

    /// Field resolved by name; unknown names yield an empty list
    pub fn distinct_values_by_name(&self, name: &str) -> Vec<String> {
        self.facets.distinct_values_by_name(name)
    }

    /// Cached, sorted genre list
    pub fn genres(&self) -> Vec<String> {
        self.facet_cache.genres()
    }

    /// Cached, ascending year list
    pub fn years(&self) -> Vec<i32> {
        self.facet_cache.years()
    }

    /// Flush pending writes and release the index directory
    pub fn close(&self) -> Result<()> {
        self.store.close()
    }
}

impl Drop for TrackCatalog {
    fn drop(&mut self) {
        if let Err(e) = self.store.close() {
            warn!("Closing catalog at {} failed: {}", self.config.index_dir.display(), e);
        }
    }
}
