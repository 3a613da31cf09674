use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CatalogError;

/// Indexed (searchable) fields of a track.
///
/// Every other track attribute is stored only and cannot be queried or
/// enumerated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    /// Prepared artist + album + track name tokens
    Keywords,
    TrackId,
    AlbumId,
    ArtistId,
    /// Release year as a decimal string
    Year,
    /// One term per genre, verbatim
    Genre,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::Keywords,
        Field::TrackId,
        Field::AlbumId,
        Field::ArtistId,
        Field::Year,
        Field::Genre,
    ];

    /// Name used in file names and on the command line
    pub fn name(self) -> &'static str {
        match self {
            Field::Keywords => "keywords",
            Field::TrackId => "trackId",
            Field::AlbumId => "albumId",
            Field::ArtistId => "artistId",
            Field::Year => "year",
            Field::Genre => "genre",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .into_iter()
            .find(|field| field.name() == s)
            .ok_or_else(|| CatalogError::UnknownField(s.to_string()))
    }
}
