//! Translate raw search-box input into a query tree.
//!
//! `"the exam"` becomes `+keywords:the +keywords:exam*`: every token but the
//! last must match exactly, the last one as a prefix.

use crate::models::{Field, SearchFilters};
use crate::query::nodes::{AllDocsQuery, BoolQuery, PrefixQuery, TermQuery};
use crate::tokenizer::{prepare_keywords, WILDCARD};

/// Build the query for a keyword search.
///
/// Returns `None` when the prepared input is blank; such searches match nothing.
pub fn build_keyword_query(keywords: Option<&str>, filters: &SearchFilters) -> Option<BoolQuery> {
    let prepared = prepare_keywords(keywords?);
    if prepared.is_empty() {
        return None;
    }

    let query = if prepared == WILDCARD {
        BoolQuery::new().must(AllDocsQuery::new())
    } else {
        let tokens: Vec<&str> = prepared.split_whitespace().collect();
        let (last, leading) = tokens.split_last()?;

        let mut query = BoolQuery::new();
        for token in leading {
            query = query.must(TermQuery::new(Field::Keywords, *token));
        }
        query.must(PrefixQuery::new(Field::Keywords, *last))
    };

    Some(with_filters(query, filters))
}

/// Add year and genre restrictions as mandatory filter clauses
pub fn with_filters(mut query: BoolQuery, filters: &SearchFilters) -> BoolQuery {
    if let Some(year) = filters.year {
        query = query.filter(TermQuery::new(Field::Year, year.to_string()));
    }
    if let Some(genre) = &filters.genre {
        query = query.filter(TermQuery::new(Field::Genre, genre.clone()));
    }
    query
}
