//! Immutable segment reader
//!
//! A segment is fully loaded into memory when opened, so a reader stays
//! valid after its files are removed from disk.

use std::collections::HashMap;
use std::io;

use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};

use super::docvalues::SortColumns;
use super::postings::FieldPostings;
use super::types::{DocNo, SegmentId};
use crate::models::{Field, SortOrder, Track};

/// Metadata for a segment stored in the manifest
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentMeta {
    pub id: SegmentId,
    pub doc_count: u32,
    /// Size in bytes (all segment files combined)
    pub size_bytes: u64,
    pub created_at: u64,
}

/// Immutable segment: per-field postings, stored tracks and sort columns
#[derive(Debug)]
pub struct SegmentReader {
    meta: SegmentMeta,
    fields: HashMap<Field, FieldPostings>,
    stored: Vec<Track>,
    sort_columns: SortColumns,
}

impl SegmentReader {
    pub fn meta(&self) -> &SegmentMeta {
        &self.meta
    }

    pub fn id(&self) -> SegmentId {
        self.meta.id
    }

    pub fn doc_count(&self) -> u32 {
        self.meta.doc_count
    }

    /// Postings of one field
    pub fn field(&self, field: Field) -> Option<&FieldPostings> {
        self.fields.get(&field)
    }

    /// Local docnos containing `term` in `field`
    pub fn term_docs(&self, field: Field, term: &str) -> Option<&RoaringBitmap> {
        self.field(field).and_then(|postings| postings.docs(term))
    }

    pub fn doc_frequency(&self, field: Field, term: &str) -> u64 {
        self.field(field).map_or(0, |postings| postings.doc_frequency(term))
    }

    /// Stored track of a local docno
    pub fn track(&self, docno: DocNo) -> Option<&Track> {
        self.stored.get(docno.as_usize())
    }

    /// Sort key of a local docno
    pub fn sort_key(&self, order: SortOrder, docno: DocNo) -> Option<&str> {
        self.sort_columns.get(order, docno)
    }

    pub fn stored(&self) -> &[Track] {
        &self.stored
    }

    pub fn sort_columns(&self) -> &SortColumns {
        &self.sort_columns
    }

    /// Number of distinct terms in a field
    pub fn term_count(&self, field: Field) -> usize {
        self.field(field).map_or(0, |postings| postings.terms().len())
    }
}

/// Builder for creating segment readers from loaded or freshly written parts
#[derive(Default)]
pub struct SegmentReaderBuilder {
    meta: Option<SegmentMeta>,
    fields: HashMap<Field, FieldPostings>,
    stored: Option<Vec<Track>>,
    sort_columns: Option<SortColumns>,
}

impl SegmentReaderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_meta(mut self, meta: SegmentMeta) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn with_field(mut self, field: Field, postings: FieldPostings) -> Self {
        self.fields.insert(field, postings);
        self
    }

    pub fn with_stored(mut self, stored: Vec<Track>) -> Self {
        self.stored = Some(stored);
        self
    }

    pub fn with_sort_columns(mut self, columns: SortColumns) -> Self {
        self.sort_columns = Some(columns);
        self
    }

    /// Assemble the reader, checking that every part agrees on the doc count
    pub fn build(self) -> io::Result<SegmentReader> {
        let invalid = |msg: String| io::Error::new(io::ErrorKind::InvalidData, msg);

        let meta = self.meta.ok_or_else(|| invalid("Missing segment meta".to_string()))?;
        let stored = self.stored.unwrap_or_default();
        let sort_columns = self.sort_columns.unwrap_or_default();

        if stored.len() != meta.doc_count as usize || sort_columns.len() != stored.len() {
            return Err(invalid(format!(
                "{}: meta says {} docs, found {} stored and {} sort rows",
                meta.id,
                meta.doc_count,
                stored.len(),
                sort_columns.len()
            )));
        }

        if let Some(missing) = Field::ALL.iter().find(|f| !self.fields.contains_key(*f)) {
            return Err(invalid(format!("{}: missing field {}", meta.id, missing)));
        }

        Ok(SegmentReader {
            meta,
            fields: self.fields,
            stored,
            sort_columns,
        })
    }
}
