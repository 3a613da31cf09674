use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{CatalogError, Result};
use crate::models::Track;

/// Receives records from a [`TrackSource`]
pub trait TrackSink {
    /// Called once per decoded record; an error must abort the feed
    fn add_track(&mut self, track: Track) -> Result<()>;

    /// Called for a record that could not be decoded
    fn skip_record(&mut self, error: CatalogError);
}

/// A feed of normalized track records
pub trait TrackSource: Send {
    /// Push every record into `sink`.
    ///
    /// An error aborts the feed; records rejected individually go to
    /// [`TrackSink::skip_record`] instead.
    fn feed(&mut self, sink: &mut dyn TrackSink) -> Result<()>;

    /// Identifies the feed contents; a change forces a rebuild on prepare
    fn fingerprint(&self) -> Option<u64> {
        None
    }
}

/// In-memory feed
#[derive(Clone, Debug, Default)]
pub struct VecSource {
    tracks: Vec<Track>,
}

impl VecSource {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self { tracks }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }
}

impl TrackSource for VecSource {
    fn feed(&mut self, sink: &mut dyn TrackSink) -> Result<()> {
        for track in &self.tracks {
            sink.add_track(track.clone())?;
        }
        Ok(())
    }

    fn fingerprint(&self) -> Option<u64> {
        let mut hasher = crc32fast::Hasher::new();
        for track in &self.tracks {
            match serde_json::to_vec(track) {
                Ok(bytes) => hasher.update(&bytes),
                Err(e) => {
                    warn!("Cannot fingerprint track {}: {}", track.track_id, e);
                    return None;
                }
            }
        }
        Some(u64::from(hasher.finalize()))
    }
}

/// One JSON-encoded [`Track`] per line; blank lines are ignored
#[derive(Clone, Debug)]
pub struct JsonLinesSource {
    path: PathBuf,
}

impl JsonLinesSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn checksum(&self) -> std::io::Result<u64> {
        let mut file = File::open(&self.path)?;
        let mut hasher = crc32fast::Hasher::new();
        let mut buf = [0u8; 64 * 1024];
        loop {
            let n = file.read(&mut buf)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
        Ok(u64::from(hasher.finalize()))
    }
}

impl TrackSource for JsonLinesSource {
    fn feed(&mut self, sink: &mut dyn TrackSink) -> Result<()> {
        let mut reader = BufReader::new(File::open(&self.path)?);
        let mut line = Vec::new();
        let mut line_no = 0usize;

        // Rows are decoded as bytes so a bad encoding only rejects its own row
        loop {
            line.clear();
            if reader.read_until(b'\n', &mut line)? == 0 {
                break;
            }
            line_no += 1;
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            match serde_json::from_slice::<Track>(&line) {
                Ok(track) => sink.add_track(track)?,
                Err(e) => sink.skip_record(CatalogError::MalformedRecord(format!(
                    "{} line {}: {}",
                    self.path.display(),
                    line_no,
                    e
                ))),
            }
        }
        Ok(())
    }

    fn fingerprint(&self) -> Option<u64> {
        match self.checksum() {
            Ok(sum) => Some(sum),
            Err(e) => {
                warn!("Cannot fingerprint {}: {}", self.path.display(), e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[derive(Default)]
    struct Collect {
        tracks: Vec<Track>,
        skipped: Vec<CatalogError>,
    }

    impl TrackSink for Collect {
        fn add_track(&mut self, track: Track) -> Result<()> {
            self.tracks.push(track);
            Ok(())
        }

        fn skip_record(&mut self, error: CatalogError) {
            self.skipped.push(error);
        }
    }

    const LINE: &str = r#"{"artistId":"a1","artistName":"Artist","albumId":"b1","albumName":"Album","year":2001,"trackId":"t1","trackName":"Song","index":1,"genres":["Rock"]}"#;

    #[test]
    fn test_json_lines_skips_undecodable_rows() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{LINE}").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "{{not json").unwrap();
        file.flush().unwrap();

        let mut source = JsonLinesSource::new(file.path());
        let mut sink = Collect::default();
        source.feed(&mut sink).unwrap();

        assert_eq!(sink.tracks.len(), 1);
        assert_eq!(sink.tracks[0].track_id, "t1");
        assert_eq!(sink.skipped.len(), 1);
        assert!(matches!(&sink.skipped[0], CatalogError::MalformedRecord(msg) if msg.contains("line 3")));
    }

    #[test]
    fn test_json_lines_skips_invalid_utf8_row() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{LINE}").unwrap();
        file.write_all(b"{\"trackName\":\"\xff\xfe\"}\r\n").unwrap();
        writeln!(file, "{}", LINE.replace("\"t1\"", "\"t2\"")).unwrap();
        file.flush().unwrap();

        let mut source = JsonLinesSource::new(file.path());
        let mut sink = Collect::default();
        source.feed(&mut sink).unwrap();

        let ids: Vec<&str> = sink.tracks.iter().map(|t| t.track_id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t2"]);
        assert_eq!(sink.skipped.len(), 1);
        assert!(matches!(&sink.skipped[0], CatalogError::MalformedRecord(msg) if msg.contains("line 2")));
    }

    #[test]
    fn test_sink_error_aborts_feed() {
        struct Refuse(usize);

        impl TrackSink for Refuse {
            fn add_track(&mut self, _track: Track) -> Result<()> {
                self.0 += 1;
                Err(CatalogError::Internal("index closed".into()))
            }

            fn skip_record(&mut self, _error: CatalogError) {}
        }

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{LINE}").unwrap();
        writeln!(file, "{LINE}").unwrap();
        file.flush().unwrap();

        let mut sink = Refuse(0);
        let err = JsonLinesSource::new(file.path()).feed(&mut sink).unwrap_err();
        assert!(matches!(err, CatalogError::Internal(_)));
        assert_eq!(sink.0, 1);
    }

    #[test]
    fn test_json_lines_missing_file_fails() {
        let mut source = JsonLinesSource::new("/nonexistent/tracks.jsonl");
        let mut sink = Collect::default();
        assert!(matches!(source.feed(&mut sink), Err(CatalogError::Io(_))));
        assert!(source.fingerprint().is_none());
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{LINE}").unwrap();
        file.flush().unwrap();
        let source = JsonLinesSource::new(file.path());
        let before = source.fingerprint();
        assert!(before.is_some());
        assert_eq!(before, source.fingerprint());

        writeln!(file, "{LINE}").unwrap();
        file.flush().unwrap();
        assert_ne!(before, source.fingerprint());
    }

    #[test]
    fn test_vec_source_fingerprint_is_deterministic() {
        let track: Track = serde_json::from_str(LINE).unwrap();
        let a = VecSource::new(vec![track.clone()]);
        let b = VecSource::new(vec![track.clone()]);
        assert_eq!(a.fingerprint(), b.fingerprint());

        let mut other = track;
        other.year = 2002;
        assert_ne!(a.fingerprint(), VecSource::new(vec![other]).fingerprint());
    }
}
