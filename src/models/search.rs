use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::filter::SearchFilters;
use crate::error::CatalogError;

/// Precomputed result orderings. Keys compare byte-wise ascending.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Artist, then year, then album, then track number
    #[default]
    Default,
    /// Year, then artist
    Artist,
    /// Year, then album
    Album,
    /// Year, then track name
    Track,
}

impl SortOrder {
    pub const ALL: [SortOrder; 4] = [
        SortOrder::Default,
        SortOrder::Artist,
        SortOrder::Album,
        SortOrder::Track,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SortOrder::Default => "default",
            SortOrder::Artist => "artist",
            SortOrder::Album => "album",
            SortOrder::Track => "track",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SortOrder {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortOrder::ALL
            .into_iter()
            .find(|order| order.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| CatalogError::Search(format!("unknown sort order: {s}")))
    }
}

/// Keyword search request
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SearchRequest {
    pub keywords: Option<String>,
    #[serde(default)]
    pub filters: SearchFilters,
    #[serde(default)]
    pub sort: SortOrder,
}

impl SearchRequest {
    pub fn new(keywords: impl Into<String>) -> Self {
        Self {
            keywords: Some(keywords.into()),
            ..Default::default()
        }
    }

    pub fn with_filters(mut self, filters: SearchFilters) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }
}
