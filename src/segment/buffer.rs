//! Mutable buffer for uncommitted writes
//!
//! Documents accumulate here until the next commit turns them into one
//! immutable segment. A pending delete-all is recorded alongside so a
//! rebuild publishes "drop everything, then these documents" atomically.

use std::collections::BTreeMap;
use std::mem;

use roaring::RoaringBitmap;

use super::docvalues::SortColumns;
use super::types::DocNo;
use crate::models::{Field, IndexDocument, Track};

/// Contents drained from the buffer at commit time
#[derive(Debug, Default)]
pub struct BufferedDocs {
    pub fields: BTreeMap<Field, BTreeMap<String, RoaringBitmap>>,
    pub stored: Vec<Track>,
    pub sort_columns: SortColumns,
    pub delete_all: bool,
}

impl BufferedDocs {
    pub fn doc_count(&self) -> u32 {
        self.stored.len() as u32
    }
}

/// In-memory buffer of documents awaiting commit
#[derive(Debug, Default)]
pub struct MutableBuffer {
    pending: BufferedDocs,
}

impl MutableBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer a document, returning its segment-local docno
    pub fn index_document(&mut self, doc: IndexDocument) -> DocNo {
        let docno = DocNo(self.pending.stored.len() as u32);

        for (field, term) in doc.terms {
            self.pending
                .fields
                .entry(field)
                .or_default()
                .entry(term)
                .or_default()
                .insert(docno.as_u32());
        }
        self.pending.sort_columns.push(&doc.sort_keys);
        self.pending.stored.push(doc.track);

        docno
    }

    /// Discard buffered documents and mark every committed document for deletion
    pub fn delete_all(&mut self) {
        self.pending = BufferedDocs {
            delete_all: true,
            ..Default::default()
        };
    }

    /// Drop everything pending, including a delete-all marker
    pub fn clear(&mut self) {
        self.pending = BufferedDocs::default();
    }

    /// Drain the buffer for commit
    pub fn take(&mut self) -> BufferedDocs {
        mem::take(&mut self.pending)
    }

    pub fn doc_count(&self) -> u32 {
        self.pending.doc_count()
    }

    /// Whether a commit would change anything
    pub fn has_pending(&self) -> bool {
        self.pending.delete_all || !self.pending.stored.is_empty()
    }
}
