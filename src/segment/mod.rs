//! Segment-based inverted index for the track catalog
//!
//! # Architecture
//!
//! - `MutableBuffer`: in-memory documents awaiting commit
//! - `SegmentReader`: immutable segment (FST dictionaries, roaring postings,
//!   stored tracks, sort columns)
//! - `SegmentManifest`: live segments, swapped atomically on disk
//! - `IndexStore`: single writer publishing `IndexSnapshot`s to readers

mod buffer;
mod docvalues;
mod index;
mod manifest;
mod postings;
mod reader;
mod store;
mod term_dict;
mod types;
mod writer;

pub use buffer::*;
pub use docvalues::*;
pub use index::*;
pub use manifest::*;
pub use postings::*;
pub use reader::*;
pub use store::*;
pub use term_dict::*;
pub use types::*;
pub use writer::*;
