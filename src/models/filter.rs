use serde::{Deserialize, Serialize};

/// Optional exact-match filters applied on top of a keyword search
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilters {
    pub year: Option<i32>,
    pub genre: Option<String>,
}

impl SearchFilters {
    /// No filtering
    pub fn none() -> Self {
        Self::default()
    }

    /// Restrict to a release year
    pub fn year(year: i32) -> Self {
        Self {
            year: Some(year),
            genre: None,
        }
    }

    /// Restrict to a genre (matched verbatim)
    pub fn genre(genre: impl Into<String>) -> Self {
        Self {
            year: None,
            genre: Some(genre.into()),
        }
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.year.is_none() && self.genre.is_none()
    }
}
