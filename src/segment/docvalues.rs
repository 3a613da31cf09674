//! Columnar per-document sort keys.
//!
//! One string column per [`SortOrder`], indexed by segment-local docno.

use std::io;

use serde::{Deserialize, Serialize};

use super::types::DocNo;
use crate::models::SortOrder;
use crate::tokenizer::SortKeys;

/// Sort key columns for one segment
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SortColumns {
    default: Vec<String>,
    artist: Vec<String>,
    album: Vec<String>,
    track: Vec<String>,
}

impl SortColumns {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            default: Vec::with_capacity(capacity),
            artist: Vec::with_capacity(capacity),
            album: Vec::with_capacity(capacity),
            track: Vec::with_capacity(capacity),
        }
    }

    /// Append the keys of the next docno
    pub fn push(&mut self, keys: &SortKeys) {
        self.default.push(keys.default.clone());
        self.artist.push(keys.artist.clone());
        self.album.push(keys.album.clone());
        self.track.push(keys.track.clone());
    }

    fn column(&self, order: SortOrder) -> &[String] {
        match order {
            SortOrder::Default => &self.default,
            SortOrder::Artist => &self.artist,
            SortOrder::Album => &self.album,
            SortOrder::Track => &self.track,
        }
    }

    /// Sort key of a document
    pub fn get(&self, order: SortOrder, docno: DocNo) -> Option<&str> {
        self.column(order)
            .get(docno.as_usize())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.default.len()
    }

    pub fn is_empty(&self) -> bool {
        self.default.is_empty()
    }

    pub fn serialize(&self) -> io::Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    pub fn deserialize(data: &[u8]) -> io::Result<Self> {
        let columns: Self =
            bincode::deserialize(data).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let len = columns.default.len();
        if [&columns.artist, &columns.album, &columns.track]
            .iter()
            .any(|column| column.len() != len)
        {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Sort columns have different lengths",
            ));
        }
        Ok(columns)
    }
}
