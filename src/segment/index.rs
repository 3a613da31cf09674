//! Index store: one writer, many point-in-time readers
//!
//! The writer buffers documents and publishes them as a new immutable
//! segment on commit. Readers acquire the snapshot current at that moment
//! and keep seeing it, untouched by later commits, until they release it.

use std::fmt;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::{Mutex, MutexGuard};
use roaring::RoaringBitmap;
use tracing::{debug, info, warn};

use super::buffer::MutableBuffer;
use super::manifest::SegmentManifest;
use super::reader::SegmentReader;
use super::store::{DirectoryLock, SegmentStore};
use super::types::DocNo;
use super::writer::SegmentWriter;
use crate::error::{CatalogError, Result};
use crate::models::{Field, IndexDocument, SortOrder, Track};
use crate::query::{AllDocsQuery, QueryContext, QueryNode};

static NEXT_STORE_ID: AtomicU64 = AtomicU64::new(1);

/// Immutable view of the committed index at one generation.
///
/// Segment-local docnos are rebased so docnos are unique across the snapshot.
pub struct IndexSnapshot {
    generation: u64,
    segments: Vec<Arc<SegmentReader>>,
    /// First global docno of each segment
    bases: Vec<u32>,
    doc_count: u32,
}

impl IndexSnapshot {
    pub fn empty() -> Self {
        Self::new(0, Vec::new())
    }

    pub fn new(generation: u64, segments: Vec<Arc<SegmentReader>>) -> Self {
        let mut bases = Vec::with_capacity(segments.len());
        let mut doc_count = 0u32;
        for segment in &segments {
            bases.push(doc_count);
            doc_count += segment.doc_count();
        }

        Self {
            generation,
            segments,
            bases,
            doc_count,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Live documents visible in this snapshot
    pub fn doc_count(&self) -> u32 {
        self.doc_count
    }

    pub fn segments(&self) -> &[Arc<SegmentReader>] {
        &self.segments
    }

    fn locate(&self, docno: DocNo) -> Option<(&SegmentReader, DocNo)> {
        if docno.0 >= self.doc_count {
            return None;
        }
        let idx = self
            .bases
            .partition_point(|&base| base <= docno.0)
            .checked_sub(1)?;
        let segment = self.segments.get(idx)?;
        Some((segment, DocNo(docno.0 - self.bases[idx])))
    }

    /// Every live docno
    pub fn all_docs(&self) -> RoaringBitmap {
        let mut docs = RoaringBitmap::new();
        docs.insert_range(0..self.doc_count);
        docs
    }

    /// Docnos whose `field` contains exactly `term`
    pub fn term_docs(&self, field: Field, term: &str) -> RoaringBitmap {
        let mut docs = RoaringBitmap::new();
        for (segment, &base) in self.segments.iter().zip(&self.bases) {
            if let Some(local) = segment.term_docs(field, term) {
                docs |= rebase(local, base);
            }
        }
        docs
    }

    /// Docnos whose `field` has a term starting with `prefix`.
    ///
    /// Each segment expands at most `max_expansions` terms; the flag reports
    /// whether any segment hit that limit.
    pub fn prefix_docs(&self, field: Field, prefix: &str, max_expansions: usize) -> (RoaringBitmap, bool) {
        let mut docs = RoaringBitmap::new();
        let mut truncated = false;
        for (segment, &base) in self.segments.iter().zip(&self.bases) {
            if let Some(postings) = segment.field(field) {
                let (local, hit_limit) = postings.prefix_docs(prefix, max_expansions);
                truncated |= hit_limit;
                docs |= rebase(&local, base);
            }
        }
        (docs, truncated)
    }

    pub fn doc_frequency(&self, field: Field, term: &str) -> u64 {
        self.segments
            .iter()
            .map(|segment| segment.doc_frequency(field, term))
            .sum()
    }

    /// Stored track of a docno
    pub fn track(&self, docno: DocNo) -> Option<&Track> {
        self.locate(docno)
            .and_then(|(segment, local)| segment.track(local))
    }

    pub fn sort_key(&self, order: SortOrder, docno: DocNo) -> Option<&str> {
        self.locate(docno)
            .and_then(|(segment, local)| segment.sort_key(order, local))
    }
}

impl fmt::Debug for IndexSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexSnapshot")
            .field("generation", &self.generation)
            .field("segments", &self.segments.len())
            .field("doc_count", &self.doc_count)
            .finish()
    }
}

fn rebase(local: &RoaringBitmap, base: u32) -> RoaringBitmap {
    if base == 0 {
        local.clone()
    } else {
        local.iter().map(|docno| docno + base).collect()
    }
}

/// A snapshot handed out by [`IndexStore::acquire`].
///
/// Must be returned through [`IndexStore::release`]; prefer
/// [`IndexStore::lease`] which does that on drop.
pub struct Snapshot {
    inner: Arc<IndexSnapshot>,
    store_id: u64,
}

impl Snapshot {
    /// Shared handle on the underlying snapshot, for handing to other threads
    pub fn shared(&self) -> Arc<IndexSnapshot> {
        Arc::clone(&self.inner)
    }
}

impl Deref for Snapshot {
    type Target = IndexSnapshot;

    fn deref(&self) -> &IndexSnapshot {
        &self.inner
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("store_id", &self.store_id)
            .field("snapshot", &self.inner)
            .finish()
    }
}

/// Snapshot released back to its store when dropped
pub struct SnapshotLease<'a> {
    store: &'a IndexStore,
    snapshot: Arc<IndexSnapshot>,
    store_id: u64,
}

impl SnapshotLease<'_> {
    pub fn shared(&self) -> Arc<IndexSnapshot> {
        Arc::clone(&self.snapshot)
    }
}

impl Deref for SnapshotLease<'_> {
    type Target = IndexSnapshot;

    fn deref(&self) -> &IndexSnapshot {
        &self.snapshot
    }
}

impl Drop for SnapshotLease<'_> {
    fn drop(&mut self) {
        let snapshot = Snapshot {
            inner: Arc::clone(&self.snapshot),
            store_id: self.store_id,
        };
        if let Err(e) = self.store.release(snapshot) {
            warn!("Failed to release snapshot: {}", e);
        }
    }
}

/// Writer-side state, present until the store is closed
struct IndexWriter {
    store: SegmentStore,
    manifest: SegmentManifest,
    buffer: MutableBuffer,
    _lock: DirectoryLock,
}

/// Owner of one index directory
pub struct IndexStore {
    id: u64,
    path: PathBuf,
    /// Held for the whole of a rebuild; every other write path waits on it
    rebuild_lock: Mutex<()>,
    writer: Mutex<Option<IndexWriter>>,
    current: ArcSwap<IndexSnapshot>,
    outstanding: AtomicUsize,
}

impl IndexStore {
    /// Open (creating if needed) the index at `path` and take its write lock.
    ///
    /// An unreadable manifest or segment yields an empty index rather than
    /// an error, so the caller's validity check can trigger a rebuild.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let store = SegmentStore::new(&path)?;
        let lock = DirectoryLock::acquire(store.base_dir())?;
        let (manifest, segments) = Self::load(&store);

        let snapshot = IndexSnapshot::new(manifest.generation, segments);
        info!(
            "Opened index at {} (generation {}, {} documents)",
            path.display(),
            snapshot.generation(),
            snapshot.doc_count()
        );

        Ok(Self {
            id: NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed),
            path,
            rebuild_lock: Mutex::new(()),
            current: ArcSwap::from_pointee(snapshot),
            writer: Mutex::new(Some(IndexWriter {
                store,
                manifest,
                buffer: MutableBuffer::new(),
                _lock: lock,
            })),
            outstanding: AtomicUsize::new(0),
        })
    }

    fn load(store: &SegmentStore) -> (SegmentManifest, Vec<Arc<SegmentReader>>) {
        let mut manifest = match store.load_manifest() {
            Ok(Some(manifest)) => manifest,
            Ok(None) => return (SegmentManifest::new(), Vec::new()),
            Err(e) => {
                warn!("Unreadable manifest, starting with an empty index: {}", e);
                return (SegmentManifest::new(), Vec::new());
            }
        };

        let loaded: Result<Vec<_>> = manifest
            .iter()
            .map(|entry| store.read_segment(entry).map(Arc::new))
            .collect();

        match loaded {
            Ok(segments) => (manifest, segments),
            Err(e) => {
                warn!("Failed to load segments, starting with an empty index: {}", e);
                manifest.clear_segments();
                manifest.source_fingerprint = None;
                (manifest, Vec::new())
            }
        }
    }

    fn with_writer<T>(&self, f: impl FnOnce(&mut IndexWriter) -> Result<T>) -> Result<T> {
        let mut guard = self.writer.lock();
        let writer = guard
            .as_mut()
            .ok_or_else(|| CatalogError::Internal(format!("index {} is closed", self.path.display())))?;
        f(writer)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Buffer a document; visible to readers after the next commit
    pub fn add_document(&self, doc: IndexDocument) -> Result<()> {
        let _rebuild = self.rebuild_lock.lock();
        self.buffer_document(doc)
    }

    fn buffer_document(&self, doc: IndexDocument) -> Result<()> {
        self.with_writer(|writer| {
            writer.buffer.index_document(doc);
            Ok(())
        })
    }

    /// Schedule removal of every committed document at the next commit
    pub fn delete_all(&self) -> Result<()> {
        let _rebuild = self.rebuild_lock.lock();
        self.with_writer(|writer| {
            writer.buffer.delete_all();
            Ok(())
        })
    }

    /// Discard uncommitted changes
    pub fn rollback(&self) -> Result<()> {
        let _rebuild = self.rebuild_lock.lock();
        self.discard_pending()
    }

    fn discard_pending(&self) -> Result<()> {
        self.with_writer(|writer| {
            writer.buffer.clear();
            Ok(())
        })
    }

    /// Start replacing the whole index.
    ///
    /// Buffered documents are discarded and committed ones go at commit. Until the returned
    /// guard is committed or dropped, other writers and [`IndexStore::close`]
    /// wait, so readers never see a partly fed rebuild.
    pub fn begin_rebuild(&self) -> Result<RebuildGuard<'_>> {
        let lock = self.rebuild_lock.lock();
        self.with_writer(|writer| {
            writer.buffer.delete_all();
            Ok(())
        })?;
        debug!("Rebuild started at generation {}", self.generation());
        Ok(RebuildGuard {
            store: self,
            committed: false,
            _lock: lock,
        })
    }

    /// Documents buffered since the last commit
    pub fn pending_docs(&self) -> u32 {
        self.with_writer(|writer| Ok(writer.buffer.doc_count()))
            .unwrap_or(0)
    }

    /// Fingerprint of the feed recorded by the last rebuild commit
    pub fn source_fingerprint(&self) -> Option<u64> {
        self.with_writer(|writer| Ok(writer.manifest.source_fingerprint))
            .ok()
            .flatten()
    }

    /// Publish buffered changes as a new generation.
    ///
    /// Waits for a rebuild in progress to finish first.
    pub fn commit(&self) -> Result<u64> {
        let _rebuild = self.rebuild_lock.lock();
        self.commit_inner(None)
    }

    fn commit_inner(&self, fingerprint: Option<Option<u64>>) -> Result<u64> {
        self.with_writer(|writer| {
            let fingerprint_changed =
                fingerprint.is_some_and(|fp| fp != writer.manifest.source_fingerprint);
            if !writer.buffer.has_pending() && !fingerprint_changed {
                return Ok(writer.manifest.generation);
            }

            let docs = writer.buffer.take();
            let delete_all = docs.delete_all;
            let doc_count = docs.doc_count();

            let mut manifest = writer.manifest.clone();
            let mut segments = if delete_all {
                manifest.clear_segments();
                Vec::new()
            } else {
                self.current.load().segments().to_vec()
            };

            if doc_count > 0 {
                let id = manifest.allocate_segment_id();
                let result = SegmentWriter::new(id).write_from_buffer(docs)?;
                writer.store.write_segment(&result)?;
                manifest.add_segment(result.reader.meta().clone(), result.checksum());
                segments.push(Arc::new(result.reader));
            }

            if let Some(fp) = fingerprint {
                manifest.source_fingerprint = fp;
            }
            manifest.advance();
            writer.store.save_manifest(&manifest)?;

            let generation = manifest.generation;
            writer.manifest = manifest;
            self.current
                .store(Arc::new(IndexSnapshot::new(generation, segments)));

            match writer.store.remove_orphans(&writer.manifest) {
                Ok(removed) if !removed.is_empty() => {
                    debug!("Removed {} unreferenced segments", removed.len());
                }
                Ok(_) => {}
                Err(e) => warn!("Failed to remove unreferenced segments: {}", e),
            }

            info!(
                "Committed generation {} ({} new documents, delete_all={})",
                generation, doc_count, delete_all
            );
            Ok(generation)
        })
    }

    /// Take the current snapshot; pair with [`IndexStore::release`]
    pub fn acquire(&self) -> Snapshot {
        self.outstanding.fetch_add(1, Ordering::SeqCst);
        Snapshot {
            inner: self.current.load_full(),
            store_id: self.id,
        }
    }

    /// Return a snapshot obtained from [`IndexStore::acquire`] on this store
    pub fn release(&self, snapshot: Snapshot) -> Result<()> {
        if snapshot.store_id != self.id {
            return Err(CatalogError::SnapshotRelease(format!(
                "snapshot was acquired from store {}, not store {}",
                snapshot.store_id, self.id
            )));
        }
        self.outstanding.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }

    /// Acquire a snapshot that releases itself when dropped
    pub fn lease(&self) -> SnapshotLease<'_> {
        let Snapshot { inner, store_id } = self.acquire();
        SnapshotLease {
            store: self,
            snapshot: inner,
            store_id,
        }
    }

    /// Snapshots acquired and not yet released
    pub fn outstanding_snapshots(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }

    pub fn generation(&self) -> u64 {
        self.current.load().generation()
    }

    pub fn doc_count(&self) -> u32 {
        self.current.load().doc_count()
    }

    /// Check the committed index with a match-all query.
    ///
    /// Valid means the query ran and found at least one document.
    pub fn is_valid(&self) -> bool {
        let lease = self.lease();
        let ctx = QueryContext::new(&lease, usize::MAX);
        match AllDocsQuery::new().execute(&ctx) {
            Ok(docs) => !docs.is_empty(),
            Err(e) => {
                warn!("Index validity check failed: {}", e);
                false
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.writer.lock().is_none()
    }

    /// Commit pending changes and release the directory lock.
    ///
    /// A rebuild in progress is allowed to finish first. Closing twice is a no-op.
    pub fn close(&self) -> Result<()> {
        let _rebuild = self.rebuild_lock.lock();
        if self.is_closed() {
            return Ok(());
        }
        self.commit_inner(None)?;

        let outstanding = self.outstanding_snapshots();
        if outstanding > 0 {
            warn!("Closing index with {} unreleased snapshots", outstanding);
        }

        self.writer.lock().take();
        info!("Closed index at {}", self.path.display());
        Ok(())
    }
}

/// Exclusive access to an [`IndexStore`] for one full rebuild.
///
/// Dropping the guard without [`RebuildGuard::commit`] discards everything
/// buffered since [`IndexStore::begin_rebuild`].
pub struct RebuildGuard<'a> {
    store: &'a IndexStore,
    committed: bool,
    _lock: MutexGuard<'a, ()>,
}

impl RebuildGuard<'_> {
    pub fn add_document(&self, doc: IndexDocument) -> Result<()> {
        self.store.buffer_document(doc)
    }

    /// Publish the rebuilt index, recording the fingerprint of its feed
    pub fn commit(&mut self, source_fingerprint: Option<u64>) -> Result<u64> {
        let generation = self.store.commit_inner(Some(source_fingerprint))?;
        self.committed = true;
        Ok(generation)
    }
}

impl Drop for RebuildGuard<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Err(e) = self.store.discard_pending() {
            warn!("Discarding abandoned rebuild of {} failed: {}", self.store.path.display(), e);
        }
    }
}

impl fmt::Debug for IndexStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexStore")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("generation", &self.generation())
            .finish()
    }
}
