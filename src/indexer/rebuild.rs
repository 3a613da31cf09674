use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{info, warn};

use super::source::{TrackSink, TrackSource};
use crate::error::{CatalogError, Result};
use crate::models::{IndexDocument, Track};
use crate::segment::{IndexStore, RebuildGuard};

/// Outcome of a full rebuild
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RebuildStats {
    pub indexed: u64,
    pub skipped: u64,
    pub elapsed: Duration,
}

/// Writes track records into an [`IndexStore`]
pub struct Indexer {
    store: Arc<IndexStore>,
}

impl Indexer {
    pub fn new(store: Arc<IndexStore>) -> Self {
        Self { store }
    }

    /// Buffer one track; it becomes searchable at the next commit
    pub fn add_document(&self, track: &Track) -> Result<()> {
        let doc = IndexDocument::from_track(track)?;
        self.store.add_document(doc)
    }

    /// Replace the whole index with the contents of `source`
    pub fn rebuild_all(&self, source: &mut dyn TrackSource) -> Result<RebuildStats> {
        self.rebuild_all_with(source, || {})
    }

    /// Like [`Indexer::rebuild_all`], running `after_commit` before the rebuild lock is released
    pub fn rebuild_all_with(
        &self,
        source: &mut dyn TrackSource,
        after_commit: impl FnOnce(),
    ) -> Result<RebuildStats> {
        let mut rebuild = self.store.begin_rebuild()?;
        let start = Instant::now();
        info!("Rebuilding index at {}", self.store.path().display());

        let mut sink = RebuildSink {
            rebuild: &rebuild,
            indexed: 0,
            skipped: 0,
        };
        let fed = source.feed(&mut sink);
        let (indexed, skipped) = (sink.indexed, sink.skipped);

        // Dropping the guard on error discards the partial rebuild
        let generation = match fed.and_then(|()| rebuild.commit(source.fingerprint())) {
            Ok(generation) => generation,
            Err(e) => {
                warn!("Rebuild aborted after {} records: {}", indexed + skipped, e);
                return Err(e);
            }
        };

        after_commit();
        drop(rebuild);

        let stats = RebuildStats {
            indexed,
            skipped,
            elapsed: start.elapsed(),
        };
        info!(
            "Rebuild complete: generation {}, {} indexed, {} skipped in {:?}",
            generation, stats.indexed, stats.skipped, stats.elapsed
        );
        Ok(stats)
    }
}

/// Only malformed records are skipped; any other error aborts the feed
struct RebuildSink<'a, 's> {
    rebuild: &'a RebuildGuard<'s>,
    indexed: u64,
    skipped: u64,
}

impl TrackSink for RebuildSink<'_, '_> {
    fn add_track(&mut self, track: Track) -> Result<()> {
        let doc = match IndexDocument::from_track(&track) {
            Ok(doc) => doc,
            Err(e @ CatalogError::MalformedRecord(_)) => {
                self.skip_record(e);
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        self.rebuild.add_document(doc)?;
        self.indexed += 1;
        Ok(())
    }

    fn skip_record(&mut self, error: CatalogError) {
        self.skipped += 1;
        warn!("Skipping record: {}", error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::VecSource;
    use crate::query::nodes::test_support::track;
    use tempfile::TempDir;

    struct FailingSource;

    impl TrackSource for FailingSource {
        fn feed(&mut self, sink: &mut dyn TrackSink) -> Result<()> {
            sink.add_track(track("x1", "A", "B", "C", 2000, "Rock"))?;
            Err(CatalogError::Internal("feed interrupted".into()))
        }
    }

    fn open() -> (TempDir, Arc<IndexStore>) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(IndexStore::open(dir.path()).unwrap());
        (dir, store)
    }

    #[test]
    fn test_rebuild_counts_and_skips_malformed() {
        let (_dir, store) = open();
        let indexer = Indexer::new(store.clone());

        let mut bad = track("", "A", "B", "C", 2000, "Rock");
        bad.track_id = "   ".into();
        let mut source = VecSource::new(vec![
            track("t1", "A", "B", "One", 2000, "Rock"),
            bad,
            track("t2", "A", "B", "Two", 2000, "Rock"),
        ]);

        let stats = indexer.rebuild_all(&mut source).unwrap();
        assert_eq!(stats.indexed, 2);
        assert_eq!(stats.skipped, 1);
        assert_eq!(store.doc_count(), 2);
        assert_eq!(store.source_fingerprint(), source.fingerprint());
    }

    #[test]
    fn test_rebuild_replaces_previous_contents() {
        let (_dir, store) = open();
        let indexer = Indexer::new(store.clone());

        let mut first = VecSource::new(vec![
            track("t1", "A", "B", "One", 2000, "Rock"),
            track("t2", "A", "B", "Two", 2000, "Rock"),
        ]);
        indexer.rebuild_all(&mut first).unwrap();
        let mut second = VecSource::new(vec![track("t3", "A", "B", "Three", 2000, "Rock")]);
        indexer.rebuild_all(&mut second).unwrap();

        assert_eq!(store.doc_count(), 1);
        let lease = store.lease();
        assert_eq!(lease.segments().len(), 1);
    }

    #[test]
    fn test_failed_feed_keeps_old_index() {
        let (_dir, store) = open();
        let indexer = Indexer::new(store.clone());
        indexer
            .rebuild_all(&mut VecSource::new(vec![track("t1", "A", "B", "One", 2000, "Rock")]))
            .unwrap();
        let generation = store.generation();

        assert!(indexer.rebuild_all(&mut FailingSource).is_err());
        assert_eq!(store.generation(), generation);
        assert_eq!(store.doc_count(), 1);
        assert_eq!(store.pending_docs(), 0);
    }

    #[test]
    fn test_after_commit_sees_new_generation() {
        let (_dir, store) = open();
        let indexer = Indexer::new(store.clone());
        let mut seen = None;

        indexer
            .rebuild_all_with(
                &mut VecSource::new(vec![track("t1", "A", "B", "One", 2000, "Rock")]),
                || seen = Some(store.doc_count()),
            )
            .unwrap();
        assert_eq!(seen, Some(1));
    }
}
