pub mod document;
pub mod field;
pub mod filter;
pub mod search;
pub mod track;

pub use document::{current_timestamp, IndexDocument};
pub use field::Field;
pub use filter::SearchFilters;
pub use search::{SearchRequest, SortOrder};
pub use track::{normalize_genres, Track, UNSPECIFIED_GENRE};
