use std::fs::{self, File, OpenOptions, TryLockError};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crc32fast::Hasher;
use tracing::debug;

use crate::error::{CatalogError, Result};
use crate::models::{Field, Track};
use crate::segment::docvalues::SortColumns;
use crate::segment::manifest::{ManifestEntry, SegmentManifest};
use crate::segment::postings::FieldPostings;
use crate::segment::reader::{SegmentReader, SegmentReaderBuilder};
use crate::segment::types::SegmentId;
use crate::segment::writer::SegmentWriteResult;

const MANIFEST_FILE: &str = "segments.manifest";
const MANIFEST_TMP_FILE: &str = "segments.manifest.tmp";
const LOCK_FILE: &str = "write.lock";
const SEGMENT_PREFIX: &str = "segment_";
const STORED_FILE: &str = "stored.bin";
const SORT_FILE: &str = "sort_keys.bin";

/// Exclusive advisory lock on an index directory.
///
/// Released when dropped.
#[derive(Debug)]
pub struct DirectoryLock {
    file: File,
    path: PathBuf,
}

impl DirectoryLock {
    /// Take the lock without blocking; a held lock yields [`CatalogError::LockHeld`]
    pub fn acquire(dir: &Path) -> Result<Self> {
        let path = dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&path)?;

        match file.try_lock() {
            Ok(()) => Ok(Self { file, path }),
            Err(TryLockError::WouldBlock) => Err(CatalogError::LockHeld(dir.to_path_buf())),
            Err(TryLockError::Error(e)) => Err(CatalogError::Io(e)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DirectoryLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            debug!(path = %self.path.display(), error = %e, "Failed to release directory lock");
        }
    }
}

/// Persistent storage for segment files and manifest.
pub struct SegmentStore {
    base_dir: PathBuf,
}

impl SegmentStore {
    pub fn new<P: AsRef<Path>>(base_dir: P) -> io::Result<Self> {
        fs::create_dir_all(&base_dir)?;
        Ok(Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn segment_dir(&self, id: SegmentId) -> PathBuf {
        self.base_dir.join(id.to_string())
    }

    fn fst_file(field: Field) -> String {
        format!("terms_{}.fst", field.name())
    }

    fn postings_file(field: Field) -> String {
        format!("postings_{}.bin", field.name())
    }

    pub fn write_segment(&self, result: &SegmentWriteResult) -> io::Result<()> {
        let dir = self.segment_dir(result.reader.id());
        fs::create_dir_all(&dir)?;

        for files in &result.fields {
            write_synced(&dir.join(Self::fst_file(files.field)), &files.fst_data)?;
            write_synced(&dir.join(Self::postings_file(files.field)), &files.postings_data)?;
        }
        write_synced(&dir.join(STORED_FILE), &result.stored_data)?;
        write_synced(&dir.join(SORT_FILE), &result.sort_data)?;
        Ok(())
    }

    /// Load a segment and verify it against the manifest checksum
    pub fn read_segment(&self, entry: &ManifestEntry) -> Result<SegmentReader> {
        let meta = entry.meta.clone();
        let dir = self.segment_dir(meta.id);
        let mut hasher = Hasher::new();
        let mut builder = SegmentReaderBuilder::new();

        for field in Field::ALL {
            let fst_data = fs::read(dir.join(Self::fst_file(field)))?;
            let postings_data = fs::read(dir.join(Self::postings_file(field)))?;
            hasher.update(&fst_data);
            hasher.update(&postings_data);
            builder = builder.with_field(field, FieldPostings::from_parts(fst_data, &postings_data)?);
        }

        let stored_data = fs::read(dir.join(STORED_FILE))?;
        let sort_data = fs::read(dir.join(SORT_FILE))?;
        hasher.update(&stored_data);
        hasher.update(&sort_data);

        let checksum = hasher.finalize() as u64;
        if checksum != entry.checksum {
            return Err(CatalogError::Corrupt(format!(
                "{} checksum mismatch: expected {:#x}, found {:#x}",
                meta.id, entry.checksum, checksum
            )));
        }

        let stored: Vec<Track> = bincode::deserialize(&stored_data)?;
        let sort_columns = SortColumns::deserialize(&sort_data)?;

        Ok(builder
            .with_meta(meta)
            .with_stored(stored)
            .with_sort_columns(sort_columns)
            .build()?)
    }

    /// Persist the manifest atomically (write tmp, fsync, rename)
    pub fn save_manifest(&self, manifest: &SegmentManifest) -> io::Result<()> {
        let bytes = manifest.to_bincode()?;
        let tmp = self.base_dir.join(MANIFEST_TMP_FILE);
        write_synced(&tmp, &bytes)?;
        fs::rename(&tmp, self.base_dir.join(MANIFEST_FILE))?;
        Ok(())
    }

    /// `None` when no manifest has been written yet
    pub fn load_manifest(&self) -> io::Result<Option<SegmentManifest>> {
        let path = self.base_dir.join(MANIFEST_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(path)?;
        SegmentManifest::from_bincode(&bytes).map(Some)
    }

    /// Segment ids with a directory on disk
    pub fn list_segments(&self) -> io::Result<Vec<SegmentId>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.base_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name();
            if let Some(id) = name
                .to_str()
                .and_then(|n| n.strip_prefix(SEGMENT_PREFIX))
                .and_then(|n| n.parse::<u64>().ok())
            {
                ids.push(SegmentId(id));
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Remove segment directories the manifest does not reference
    pub fn remove_orphans(&self, manifest: &SegmentManifest) -> io::Result<Vec<SegmentId>> {
        let mut removed = Vec::new();
        for id in self.list_segments()? {
            if !manifest.contains(id) {
                fs::remove_dir_all(self.segment_dir(id))?;
                removed.push(id);
            }
        }
        Ok(removed)
    }
}

fn write_synced(path: &Path, data: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(data)?;
    file.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IndexDocument;
    use crate::segment::buffer::MutableBuffer;
    use crate::segment::writer::SegmentWriter;
    use tempfile::TempDir;

    fn write_one(store: &SegmentStore, id: u64) -> ManifestEntry {
        let track = Track {
            artist_id: "ar".to_string(),
            artist_name: "Artist".to_string(),
            album_id: "al".to_string(),
            album_name: "Album".to_string(),
            album_image: String::new(),
            year: 2010,
            track_id: format!("t{id}"),
            track_name: "Name".to_string(),
            index: 1,
            location: String::new(),
            is_preferred: false,
            genres: vec![],
        };
        let mut buffer = MutableBuffer::new();
        buffer.index_document(IndexDocument::from_track(&track).unwrap());
        let result = SegmentWriter::new(SegmentId(id))
            .write_from_buffer(buffer.take())
            .unwrap();
        store.write_segment(&result).unwrap();
        ManifestEntry {
            meta: result.reader.meta().clone(),
            checksum: result.checksum(),
        }
    }

    #[test]
    fn test_segment_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = SegmentStore::new(dir.path()).unwrap();
        let entry = write_one(&store, 0);

        let reader = store.read_segment(&entry).unwrap();
        assert_eq!(reader.doc_count(), 1);
        assert_eq!(reader.doc_frequency(Field::Genre, "Unspecified"), 1);
        assert_eq!(reader.stored()[0].track_id, "t0");
    }

    #[test]
    fn test_checksum_mismatch_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let store = SegmentStore::new(dir.path()).unwrap();
        let mut entry = write_one(&store, 0);
        entry.checksum ^= 1;

        let err = store.read_segment(&entry).unwrap_err();
        assert!(matches!(err, CatalogError::Corrupt(_)));
    }

    #[test]
    fn test_manifest_persistence() {
        let dir = TempDir::new().unwrap();
        let store = SegmentStore::new(dir.path()).unwrap();
        assert!(store.load_manifest().unwrap().is_none());

        let mut manifest = SegmentManifest::new();
        manifest.add_segment(write_one(&store, 0).meta, 1);
        manifest.advance();
        store.save_manifest(&manifest).unwrap();

        assert_eq!(store.load_manifest().unwrap(), Some(manifest));
        assert!(!dir.path().join(MANIFEST_TMP_FILE).exists());
    }

    #[test]
    fn test_remove_orphans() {
        let dir = TempDir::new().unwrap();
        let store = SegmentStore::new(dir.path()).unwrap();
        let kept = write_one(&store, 0);
        write_one(&store, 1);

        let mut manifest = SegmentManifest::new();
        manifest.add_segment(kept.meta, kept.checksum);

        let removed = store.remove_orphans(&manifest).unwrap();
        assert_eq!(removed, vec![SegmentId(1)]);
        assert_eq!(store.list_segments().unwrap(), vec![SegmentId(0)]);
    }

    #[test]
    fn test_directory_lock_is_exclusive() {
        let dir = TempDir::new().unwrap();
        let lock = DirectoryLock::acquire(dir.path()).unwrap();
        assert!(lock.path().ends_with(LOCK_FILE));

        let err = DirectoryLock::acquire(dir.path()).unwrap_err();
        assert!(matches!(err, CatalogError::LockHeld(_)));

        drop(lock);
        assert!(DirectoryLock::acquire(dir.path()).is_ok());
    }
}
