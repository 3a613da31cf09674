//! Embedded search engine for a music track catalog.
//!
//! The catalog is rebuilt wholesale from a normalized track feed and then
//! answers search-as-you-type keyword queries, faceted filters, stable sort
//! orders, single-record lookups and shuffled radio playlists.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        TrackCatalog                          │
//! ├──────────────┬──────────────┬──────────────┬─────────────────┤
//! │ QueryEngine  │ SamplerEngine│ FacetEnum.   │ Indexer         │
//! │ (search,     │ (shuffled    │ (distinct    │ (rebuild_all,   │
//! │  get_by_id)  │  playlists)  │  values)     │  add_document)  │
//! ├──────────────┴──────────────┴──────────────┴─────────────────┤
//! │ IndexStore: single writer + ArcSwap'd point-in-time snapshots │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Segments: FST term dictionaries, roaring postings,           │
//! │           stored tracks, sort-key columns                    │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod facets;
pub mod indexer;
pub mod models;
pub mod query;
pub mod sampler;
pub mod segment;
pub mod tokenizer;

pub use catalog::TrackCatalog;
pub use config::{CatalogConfig, QueryConfig, SamplerConfig};
pub use error::{CatalogError, Result};
pub use facets::{FacetCache, FacetEnumerator};
pub use indexer::{Indexer, JsonLinesSource, RebuildStats, TrackSink, TrackSource, VecSource};
pub use models::*;
pub use query::QueryEngine;
pub use sampler::SamplerEngine;
pub use segment::{IndexSnapshot, IndexStore, RebuildGuard, Snapshot, SnapshotLease};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
