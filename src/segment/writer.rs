//! Segment writer for creating new immutable segments
//!
//! At commit the drained buffer becomes one segment made of:
//! - per field: FST term dictionary + framed roaring postings
//! - stored tracks (bincode)
//! - sort key columns (bincode)

use std::io;

use crc32fast::Hasher;

use super::buffer::BufferedDocs;
use super::postings::FieldPostings;
use super::reader::{SegmentMeta, SegmentReader, SegmentReaderBuilder};
use super::types::SegmentId;
use crate::models::{current_timestamp, Field};

/// Persisted bytes of one field
pub struct FieldFiles {
    pub field: Field,
    pub fst_data: Vec<u8>,
    pub postings_data: Vec<u8>,
}

/// Result of writing a segment
pub struct SegmentWriteResult {
    /// The created segment reader
    pub reader: SegmentReader,
    pub fields: Vec<FieldFiles>,
    /// Stored tracks serialized
    pub stored_data: Vec<u8>,
    /// Sort columns serialized
    pub sort_data: Vec<u8>,
}

impl SegmentWriteResult {
    /// CRC32 over every persisted artifact, in the order they are written.
    ///
    /// The manifest entry carries this value and loading recomputes it.
    pub fn checksum(&self) -> u64 {
        let mut hasher = Hasher::new();
        for files in &self.fields {
            hasher.update(&files.fst_data);
            hasher.update(&files.postings_data);
        }
        hasher.update(&self.stored_data);
        hasher.update(&self.sort_data);
        hasher.finalize() as u64
    }
}

/// Writer for creating new segments from buffered documents
pub struct SegmentWriter {
    segment_id: SegmentId,
}

impl SegmentWriter {
    pub fn new(segment_id: SegmentId) -> Self {
        Self { segment_id }
    }

    /// Write a segment from drained buffer contents
    pub fn write_from_buffer(&self, mut docs: BufferedDocs) -> io::Result<SegmentWriteResult> {
        let doc_count = docs.doc_count();
        let mut postings = Vec::with_capacity(Field::ALL.len());
        let mut fields = Vec::with_capacity(Field::ALL.len());

        for field in Field::ALL {
            let terms = docs.fields.remove(&field).unwrap_or_default();
            let field_postings = FieldPostings::from_terms(terms)?;
            fields.push(FieldFiles {
                field,
                fst_data: field_postings.terms().fst_bytes().to_vec(),
                postings_data: field_postings.serialize_postings()?,
            });
            postings.push((field, field_postings));
        }

        let stored_data = bincode::serialize(&docs.stored)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let sort_data = docs.sort_columns.serialize()?;

        let field_bytes: usize = fields
            .iter()
            .map(|f| f.fst_data.len() + f.postings_data.len())
            .sum();
        let meta = SegmentMeta {
            id: self.segment_id,
            doc_count,
            size_bytes: (field_bytes + stored_data.len() + sort_data.len()) as u64,
            created_at: current_timestamp(),
        };

        let mut builder = SegmentReaderBuilder::new()
            .with_meta(meta)
            .with_stored(docs.stored)
            .with_sort_columns(docs.sort_columns);
        for (field, field_postings) in postings {
            builder = builder.with_field(field, field_postings);
        }

        Ok(SegmentWriteResult {
            reader: builder.build()?,
            fields,
            stored_data,
            sort_data,
        })
    }
}
