//! Term dictionary using FST (Finite State Transducer)
//!
//! Each term maps to an ordinal into the field's postings array.
//! The FST gives O(|key|) exact lookups and automaton-driven prefix scans.

use std::io;

use fst::automaton::{Automaton, Str};
use fst::{IntoStreamer, Map, MapBuilder, Streamer};

/// Term dictionary backed by FST
pub struct TermDictionary {
    /// FST mapping term -> ordinal
    fst: Map<Vec<u8>>,
}

impl TermDictionary {
    /// Open a dictionary from serialized FST bytes
    pub fn new(fst_data: Vec<u8>) -> io::Result<Self> {
        let fst = Map::new(fst_data).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok(Self { fst })
    }

    /// Build a dictionary from terms already in byte order, numbering them 0..n
    pub fn from_sorted<'a>(terms: impl IntoIterator<Item = &'a str>) -> io::Result<Self> {
        let mut builder = MapBuilder::memory();
        for (ordinal, term) in terms.into_iter().enumerate() {
            builder
                .insert(term.as_bytes(), ordinal as u64)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        }

        let fst_data = builder.into_inner().map_err(io::Error::other)?;
        Self::new(fst_data)
    }

    /// Ordinal of a term
    pub fn get(&self, term: &str) -> Option<usize> {
        self.fst.get(term.as_bytes()).map(|ord| ord as usize)
    }

    pub fn contains(&self, term: &str) -> bool {
        self.fst.contains_key(term.as_bytes())
    }

    pub fn len(&self) -> usize {
        self.fst.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fst.is_empty()
    }

    /// Terms starting with `prefix`, in byte order, capped at `limit`.
    ///
    /// The boolean is true when more terms matched than were returned.
    pub fn prefix_search(&self, prefix: &str, limit: usize) -> (Vec<(String, usize)>, bool) {
        let matcher = Str::new(prefix).starts_with();
        let mut stream = self.fst.search(matcher).into_stream();
        let mut results = Vec::new();

        while let Some((key, ord)) = stream.next() {
            if results.len() == limit {
                return (results, true);
            }
            if let Ok(term) = std::str::from_utf8(key) {
                results.push((term.to_string(), ord as usize));
            }
        }

        (results, false)
    }

    /// All terms in byte order
    pub fn iter_terms(&self) -> Vec<String> {
        let mut results = Vec::with_capacity(self.len());
        let mut stream = self.fst.stream();
        while let Some((key, _)) = stream.next() {
            if let Ok(term) = std::str::from_utf8(key) {
                results.push(term.to_string());
            }
        }
        results
    }

    /// Raw FST bytes (for persistence)
    pub fn fst_bytes(&self) -> &[u8] {
        self.fst.as_fst().as_bytes()
    }
}

impl std::fmt::Debug for TermDictionary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TermDictionary")
            .field("terms", &self.len())
            .finish()
    }
}
