//! Segment manifest for tracking live segments
//!
//! Commit protocol:
//! 1. Write new segment files
//! 2. Write `segments.manifest.tmp` and fsync it
//! 3. Rename over `segments.manifest`
//! 4. Remove segment directories the new manifest no longer references

use std::io;

use serde::{Deserialize, Serialize};

use super::reader::SegmentMeta;
use super::types::SegmentId;
use crate::models::current_timestamp;

/// Manifest entry for a segment
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub meta: SegmentMeta,
    /// CRC32 of the segment files
    pub checksum: u64,
}

/// The segment manifest tracks all live segments
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentManifest {
    /// Manifest format version
    pub version: u32,
    /// Incremented on each commit
    pub generation: u64,
    pub next_segment_id: SegmentId,
    /// Live segments, in docno-base order
    pub segments: Vec<ManifestEntry>,
    /// Fingerprint of the feed the index was last rebuilt from
    pub source_fingerprint: Option<u64>,
    pub updated_at: u64,
}

impl SegmentManifest {
    /// Current manifest format version
    pub const VERSION: u32 = 1;

    pub fn new() -> Self {
        Self {
            version: Self::VERSION,
            generation: 0,
            next_segment_id: SegmentId::new(0),
            segments: Vec::new(),
            source_fingerprint: None,
            updated_at: 0,
        }
    }

    /// Allocate a new segment ID
    pub fn allocate_segment_id(&mut self) -> SegmentId {
        let id = self.next_segment_id;
        self.next_segment_id = id.next();
        id
    }

    /// Append a freshly written segment
    pub fn add_segment(&mut self, meta: SegmentMeta, checksum: u64) {
        self.segments.push(ManifestEntry { meta, checksum });
    }

    /// Drop every segment, returning the removed entries
    pub fn clear_segments(&mut self) -> Vec<ManifestEntry> {
        std::mem::take(&mut self.segments)
    }

    /// Mark the manifest as a new generation
    pub fn advance(&mut self) {
        self.generation += 1;
        self.updated_at = current_timestamp();
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn contains(&self, segment_id: SegmentId) -> bool {
        self.segments.iter().any(|e| e.meta.id == segment_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ManifestEntry> {
        self.segments.iter()
    }

    pub fn to_bincode(&self) -> io::Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    pub fn from_bincode(data: &[u8]) -> io::Result<Self> {
        let manifest: Self =
            bincode::deserialize(data).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        if manifest.version != Self::VERSION {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Unsupported manifest version {}", manifest.version),
            ));
        }
        Ok(manifest)
    }
}

impl Default for SegmentManifest {
    fn default() -> Self {
        Self::new()
    }
}
