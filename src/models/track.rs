use serde::{Deserialize, Serialize};

/// Genre assigned to tracks whose feed record carries no usable genre
pub const UNSPECIFIED_GENRE: &str = "Unspecified";

/// One normalized track as produced by the upstream feed.
///
/// Field names follow the feed's camelCase JSON so a `.jsonl` export can be
/// decoded directly.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub artist_id: String,
    pub artist_name: String,
    pub album_id: String,
    pub album_name: String,
    #[serde(default)]
    pub album_image: String,
    pub year: i32,
    pub track_id: String,
    pub track_name: String,
    pub index: u32,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub is_preferred: bool,
    #[serde(default)]
    pub genres: Vec<String>,
}

impl Track {
    /// Genres as they will be indexed: blanks dropped, never empty
    pub fn indexed_genres(&self) -> Vec<String> {
        normalize_genres(&self.genres)
    }

    /// A record is malformed when it cannot be addressed by id
    pub fn is_malformed(&self) -> bool {
        self.track_id.trim().is_empty()
    }
}

/// Drop blank genre strings; fall back to [`UNSPECIFIED_GENRE`] when nothing is left.
pub fn normalize_genres(genres: &[String]) -> Vec<String> {
    let kept: Vec<String> = genres
        .iter()
        .filter(|g| !g.trim().is_empty())
        .cloned()
        .collect();

    if kept.is_empty() {
        vec![UNSPECIFIED_GENRE.to_string()]
    } else {
        kept
    }
}
