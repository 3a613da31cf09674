//! Full-corpus indexing
//!
//! A [`TrackSource`] streams normalized track records into a [`TrackSink`];
//! the [`Indexer`] is the sink that turns them into index documents and
//! publishes the result with a single commit.

mod rebuild;
mod source;

pub use rebuild::{Indexer, RebuildStats};
pub use source::{JsonLinesSource, TrackSink, TrackSource, VecSource};
