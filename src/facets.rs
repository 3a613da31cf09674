//! Facet value enumeration and the cached filter choices built from it.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::error::Result;
use crate::models::Field;
use crate::segment::IndexStore;

/// Lists the distinct indexed values of a field
pub struct FacetEnumerator {
    store: Arc<IndexStore>,
}

impl FacetEnumerator {
    pub fn new(store: Arc<IndexStore>) -> Self {
        Self { store }
    }

    /// Distinct values of `field` in no particular order; errors yield an empty list
    pub fn distinct_values(&self, field: Field) -> Vec<String> {
        match self.try_distinct_values(field) {
            Ok(values) => values,
            Err(e) => {
                warn!("Enumerating {} values failed: {}", field, e);
                Vec::new()
            }
        }
    }

    pub fn try_distinct_values(&self, field: Field) -> Result<Vec<String>> {
        let lease = self.store.lease();
        let mut seen = HashSet::new();
        let mut values = Vec::new();

        for segment in lease.segments() {
            let Some(postings) = segment.field(field) else {
                continue;
            };
            for term in postings.terms().iter_terms() {
                if seen.insert(term.clone()) {
                    values.push(term);
                }
            }
        }

        debug!("Field {} has {} distinct values", field, values.len());
        Ok(values)
    }

    /// Like [`FacetEnumerator::distinct_values`], resolving the field by name
    pub fn distinct_values_by_name(&self, name: &str) -> Vec<String> {
        match name.parse::<Field>() {
            Ok(field) => self.distinct_values(field),
            Err(e) => {
                warn!("{}", e);
                Vec::new()
            }
        }
    }
}

#[derive(Debug, Default)]
struct FacetLists {
    genres: Vec<String>,
    years: Vec<i32>,
}

/// Sorted genre and year lists, refreshed after each rebuild
#[derive(Debug, Default)]
pub struct FacetCache {
    lists: RwLock<FacetLists>,
}

impl FacetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refresh(&self, enumerator: &FacetEnumerator) {
        let mut genres = enumerator.distinct_values(Field::Genre);
        genres.sort();

        let mut years: Vec<i32> = enumerator
            .distinct_values(Field::Year)
            .iter()
            .filter_map(|y| y.parse().ok())
            .collect();
        years.sort_unstable();

        debug!("Facet cache refreshed: {} genres, {} years", genres.len(), years.len());
        *self.lists.write() = FacetLists { genres, years };
    }

    pub fn genres(&self) -> Vec<String> {
        self.lists.read().genres.clone()
    }

    pub fn years(&self) -> Vec<i32> {
        self.lists.read().years.clone()
    }
}
