//! Shuffled playlists ("radio" mode).
//!
//! Small requests are served by rejection sampling on a worker thread that
//! draws random candidates until it has enough distinct tracks or the
//! caller's timeout fires. Whatever was collected by then is returned.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::channel::{self, RecvTimeoutError};
use parking_lot::Mutex;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, warn};

use crate::config::SamplerConfig;
use crate::error::{CatalogError, Result};
use crate::models::{Field, Track};
use crate::query::{AllDocsQuery, QueryContext, QueryExecutor, QueryNode, TermQuery};
use crate::segment::{DocNo, IndexSnapshot, IndexStore};

const WORKER_NAME: &str = "playlist-sampler";

/// State shared between the caller and one sampling worker
struct SamplerShared {
    collected: Mutex<Vec<Track>>,
    cancelled: AtomicBool,
}

/// Produces random playlists from the current snapshot
pub struct SamplerEngine {
    store: Arc<IndexStore>,
    config: SamplerConfig,
}

impl SamplerEngine {
    pub fn new(store: Arc<IndexStore>, config: SamplerConfig) -> Self {
        Self { store, config }
    }

    /// Up to `size` distinct random tracks, optionally from one year.
    ///
    /// Errors are logged and yield an empty playlist.
    pub fn shuffled_playlist(&self, size: usize, year: Option<i32>) -> Vec<Track> {
        match self.try_shuffled_playlist(size, year) {
            Ok(tracks) => tracks,
            Err(e) => {
                warn!("Shuffled playlist (size {}, year {:?}) failed: {}", size, year, e);
                Vec::new()
            }
        }
    }

    pub fn try_shuffled_playlist(&self, size: usize, year: Option<i32>) -> Result<Vec<Track>> {
        self.sample(size, year, self.config.timeout())
    }

    /// Same as [`SamplerEngine::try_shuffled_playlist`] with an explicit timeout
    pub fn sample(&self, size: usize, year: Option<i32>, timeout: Duration) -> Result<Vec<Track>> {
        if size == 0 {
            return Ok(Vec::new());
        }

        let lease = self.store.lease();
        let ctx = QueryContext::new(&lease, usize::MAX);
        let query: Box<dyn QueryNode> = match year {
            Some(year) => Box::new(TermQuery::new(Field::Year, year.to_string())),
            None => Box::new(AllDocsQuery::new()),
        };
        let candidates: Vec<u32> = QueryExecutor::matches(query.as_ref(), &ctx)?.iter().collect();

        if size >= candidates.len() {
            let mut tracks: Vec<Track> = candidates
                .iter()
                .filter_map(|&docno| lease.track(DocNo(docno)).cloned())
                .collect();
            tracks.shuffle(&mut rand::thread_rng());
            return Ok(tracks);
        }

        let tracks = sample_with_timeout(lease.shared(), candidates, size, timeout)?;
        debug!("Sampled {} of {} requested tracks", tracks.len(), size);
        Ok(tracks)
    }
}

/// Run rejection sampling on a worker, waiting at most `timeout` for it
fn sample_with_timeout(
    snapshot: Arc<IndexSnapshot>,
    candidates: Vec<u32>,
    size: usize,
    timeout: Duration,
) -> Result<Vec<Track>> {
    let shared = Arc::new(SamplerShared {
        collected: Mutex::new(Vec::with_capacity(size)),
        cancelled: AtomicBool::new(false),
    });
    let (done_tx, done_rx) = channel::bounded::<()>(1);

    let worker = {
        let shared = Arc::clone(&shared);
        thread::Builder::new()
            .name(WORKER_NAME.to_string())
            .spawn(move || {
                draw_distinct(&snapshot, &candidates, size, &shared);
                let _ = done_tx.send(());
            })
            .map_err(|e| CatalogError::Internal(format!("failed to spawn sampler: {e}")))?
    };

    match done_rx.recv_timeout(timeout) {
        Ok(()) => {
            if worker.join().is_err() {
                warn!("Sampler worker panicked after completing");
            }
        }
        Err(RecvTimeoutError::Timeout) => {
            shared.cancelled.store(true, Ordering::SeqCst);
            debug!("Sampler timed out after {:?}, returning partial playlist", timeout);
        }
        Err(RecvTimeoutError::Disconnected) => {
            warn!("Sampler worker exited without completing");
        }
    }

    let tracks = std::mem::take(&mut *shared.collected.lock());
    Ok(tracks)
}

/// Draw random candidates until `size` distinct track ids are collected or cancelled
fn draw_distinct(snapshot: &IndexSnapshot, candidates: &[u32], size: usize, shared: &SamplerShared) {
    let mut rng = rand::thread_rng();
    let mut seen: HashSet<&str> = HashSet::with_capacity(size);

    while !shared.cancelled.load(Ordering::SeqCst) {
        let docno = candidates[rng.gen_range(0..candidates.len())];
        let Some(track) = snapshot.track(DocNo(docno)) else {
            continue;
        };
        if !seen.insert(track.track_id.as_str()) {
            continue;
        }

        let mut collected = shared.collected.lock();
        collected.push(track.clone());
        if collected.len() >= size {
            break;
        }
    }
}
