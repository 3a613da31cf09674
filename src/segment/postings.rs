//! Per-field inverted index: an FST term dictionary plus one roaring bitmap
//! of segment-local docnos per term.
//!
//! On disk the bitmaps are framed as a vbyte count followed by
//! `vbyte(len) ++ roaring bytes` for each term, in term-ordinal order.

use std::collections::BTreeMap;
use std::io;

use roaring::RoaringBitmap;

use super::term_dict::TermDictionary;

/// Variable-byte encoding for integers
pub fn encode_vbyte(value: u32, output: &mut Vec<u8>) {
    let mut v = value;
    loop {
        let byte = (v & 0x7F) as u8;
        v >>= 7;
        if v == 0 {
            output.push(byte | 0x80);
            break;
        } else {
            output.push(byte);
        }
    }
}

/// Decode a variable-byte encoded integer
pub fn decode_vbyte(input: &[u8], pos: &mut usize) -> io::Result<u32> {
    let mut result: u32 = 0;
    let mut shift = 0;

    loop {
        let Some(&byte) = input.get(*pos) else {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "Unexpected end of vbyte",
            ));
        };
        *pos += 1;

        result |= ((byte & 0x7F) as u32) << shift;

        if byte & 0x80 != 0 {
            return Ok(result);
        }

        shift += 7;
        if shift > 28 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "VByte value too large",
            ));
        }
    }
}

/// Terms and postings of one indexed field within one segment
#[derive(Debug)]
pub struct FieldPostings {
    terms: TermDictionary,
    /// Indexed by term ordinal
    postings: Vec<RoaringBitmap>,
}

impl FieldPostings {
    /// Build from an ordered term -> docs map
    pub fn from_terms(terms: BTreeMap<String, RoaringBitmap>) -> io::Result<Self> {
        let dict = TermDictionary::from_sorted(terms.keys().map(String::as_str))?;
        let postings = terms.into_values().collect();
        Ok(Self {
            terms: dict,
            postings,
        })
    }

    /// Reopen from persisted FST bytes and framed postings
    pub fn from_parts(fst_data: Vec<u8>, postings_data: &[u8]) -> io::Result<Self> {
        let terms = TermDictionary::new(fst_data)?;

        let mut pos = 0;
        let count = decode_vbyte(postings_data, &mut pos)? as usize;
        if count != terms.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{} postings for {} terms", count, terms.len()),
            ));
        }

        let mut postings = Vec::with_capacity(count);
        for _ in 0..count {
            let len = decode_vbyte(postings_data, &mut pos)? as usize;
            let end = pos + len;
            let bytes = postings_data.get(pos..end).ok_or_else(|| {
                io::Error::new(io::ErrorKind::UnexpectedEof, "Truncated postings")
            })?;
            postings.push(RoaringBitmap::deserialize_from(bytes)?);
            pos = end;
        }

        Ok(Self { terms, postings })
    }

    /// Serialize postings in ordinal order
    pub fn serialize_postings(&self) -> io::Result<Vec<u8>> {
        let mut output = Vec::new();
        encode_vbyte(self.postings.len() as u32, &mut output);

        let mut scratch = Vec::new();
        for bitmap in &self.postings {
            scratch.clear();
            bitmap.serialize_into(&mut scratch)?;
            encode_vbyte(scratch.len() as u32, &mut output);
            output.extend_from_slice(&scratch);
        }

        Ok(output)
    }

    pub fn terms(&self) -> &TermDictionary {
        &self.terms
    }

    /// Documents containing exactly `term`
    pub fn docs(&self, term: &str) -> Option<&RoaringBitmap> {
        self.terms.get(term).and_then(|ord| self.postings.get(ord))
    }

    pub fn doc_frequency(&self, term: &str) -> u64 {
        self.docs(term).map_or(0, RoaringBitmap::len)
    }

    /// Union of the documents of every term starting with `prefix`.
    ///
    /// At most `max_expansions` terms are unioned; the flag reports truncation.
    pub fn prefix_docs(&self, prefix: &str, max_expansions: usize) -> (RoaringBitmap, bool) {
        let (matches, truncated) = self.terms.prefix_search(prefix, max_expansions);
        let mut result = RoaringBitmap::new();
        for (_, ord) in matches {
            if let Some(bitmap) = self.postings.get(ord) {
                result |= bitmap;
            }
        }
        (result, truncated)
    }
}
