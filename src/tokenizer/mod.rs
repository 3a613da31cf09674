//! Keyword preparation shared by indexing and querying, plus sort-key
//! construction.

pub mod keywords;
pub mod sort_key;

pub use keywords::{prepare_keywords, KeywordTokenizer, WILDCARD};
pub use sort_key::{component_key, pad_number, pad_year, SortKeys, NUMBER_WIDTH};
