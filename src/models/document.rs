use crate::error::{CatalogError, Result};
use crate::tokenizer::{KeywordTokenizer, SortKeys};

use super::field::Field;
use super::track::Track;

/// A track prepared for indexing: the stored record plus every indexed term
/// and its precomputed sort keys.
#[derive(Clone, Debug)]
pub struct IndexDocument {
    /// Stored attributes, genres already normalized
    pub track: Track,
    /// Prepared keyword text the keyword terms were taken from
    pub keywords: String,
    pub terms: Vec<(Field, String)>,
    pub sort_keys: SortKeys,
}

impl IndexDocument {
    /// Build the index representation of a track.
    ///
    /// Fails with [`CatalogError::MalformedRecord`] when the track id is blank.
    pub fn from_track(track: &Track) -> Result<Self> {
        if track.is_malformed() {
            return Err(CatalogError::MalformedRecord(format!(
                "track '{}' has no trackId",
                track.track_name
            )));
        }

        let mut track = track.clone();
        track.genres = track.indexed_genres();

        let keywords = KeywordTokenizer::keyword_text(
            &track.artist_name,
            &track.album_name,
            &track.track_name,
        );

        let mut terms: Vec<(Field, String)> = KeywordTokenizer::new()
            .unique_terms(&keywords)
            .into_iter()
            .map(|term| (Field::Keywords, term))
            .collect();

        terms.push((Field::TrackId, track.track_id.clone()));
        for (field, value) in [
            (Field::AlbumId, &track.album_id),
            (Field::ArtistId, &track.artist_id),
        ] {
            if !value.is_empty() {
                terms.push((field, value.clone()));
            }
        }
        terms.push((Field::Year, track.year.to_string()));
        for genre in &track.genres {
            terms.push((Field::Genre, genre.clone()));
        }

        let sort_keys = SortKeys::for_track(&track);

        Ok(Self {
            track,
            keywords,
            terms,
            sort_keys,
        })
    }

    /// Terms of one field
    pub fn terms_for(&self, field: Field) -> impl Iterator<Item = &str> {
        self.terms
            .iter()
            .filter(move |(f, _)| *f == field)
            .map(|(_, term)| term.as_str())
    }
}

/// Seconds since the Unix epoch
pub fn current_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
