use serde::{Deserialize, Serialize};

use super::keywords::prepare_keywords;
use crate::models::{SortOrder, Track};

/// Zero-padding width for numeric sort components
pub const NUMBER_WIDTH: usize = 10;

/// Sort component for a name: prepared keywords with all whitespace removed
pub fn component_key(value: &str) -> String {
    prepare_keywords(value)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// Left-pad `n` with zeros so byte order matches numeric order
pub fn pad_number(n: u64) -> String {
    format!("{:0width$}", n, width = NUMBER_WIDTH)
}

/// Years are clamped at zero before padding
pub fn pad_year(year: i32) -> String {
    pad_number(year.max(0) as u64)
}

/// The four precomputed sort keys of a track
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKeys {
    pub default: String,
    pub artist: String,
    pub album: String,
    pub track: String,
}

impl SortKeys {
    pub fn for_track(track: &Track) -> Self {
        let artist = component_key(&track.artist_name);
        let album = component_key(&track.album_name);
        let name = component_key(&track.track_name);
        let year = pad_year(track.year);
        let index = pad_number(u64::from(track.index));

        Self {
            default: format!("{artist}{year}{album}{index}"),
            artist: format!("{year}{artist}"),
            album: format!("{year}{album}"),
            track: format!("{year}{name}"),
        }
    }

    pub fn get(&self, order: SortOrder) -> &str {
        match order {
            SortOrder::Default => &self.default,
            SortOrder::Artist => &self.artist,
            SortOrder::Album => &self.album,
            SortOrder::Track => &self.track,
        }
    }
}
