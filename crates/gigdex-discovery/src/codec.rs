//! Shareable query-string representation of a [`FacetSelection`].
//!
//! Keys: `category`, `difficulty`, `rating`, `q`, `sort`. Unconstrained facets
//! are omitted; `sort` is always written. Decoding never fails: missing or
//! empty values mean "no constraint" and an unknown sort falls back to the
//! default.

use std::collections::BTreeMap;

use gigdex_core::{Difficulty, RatingBucket};
use url::form_urlencoded;

use crate::selection::{CategoryFilter, FacetSelection, SortKey};

pub const CATEGORY_KEY: &str = "category";
pub const DIFFICULTY_KEY: &str = "difficulty";
pub const RATING_KEY: &str = "rating";
pub const SEARCH_KEY: &str = "q";
pub const SORT_KEY: &str = "sort";

/// Keys in the order they are written to a query string.
pub const KEY_ORDER: [&str; 5] = [CATEGORY_KEY, DIFFICULTY_KEY, RATING_KEY, SEARCH_KEY, SORT_KEY];

pub type QueryMap = BTreeMap<String, String>;

pub fn encode(selection: &FacetSelection) -> QueryMap {
    let mut map = QueryMap::new();
    if let CategoryFilter::Only(category) = &selection.category {
        map.insert(CATEGORY_KEY.to_string(), category.clone());
    }
    if !selection.difficulties.is_empty() {
        let joined = selection
            .difficulties
            .iter()
            .map(Difficulty::as_str)
            .collect::<Vec<_>>()
            .join(",");
        map.insert(DIFFICULTY_KEY.to_string(), joined);
    }
    if !selection.rating_buckets.is_empty() {
        let joined = selection
            .rating_buckets
            .iter()
            .map(RatingBucket::id)
            .collect::<Vec<_>>()
            .join(",");
        map.insert(RATING_KEY.to_string(), joined);
    }
    if !selection.search_text.is_empty() {
        map.insert(SEARCH_KEY.to_string(), selection.search_text.clone());
    }
    map.insert(SORT_KEY.to_string(), selection.sort.as_str().to_string());
    map
}

/// Decodes query pairs. Repeated `difficulty` / `rating` keys (as sent by
/// checkbox forms) are merged; for the other keys the last value wins.
/// Keys this codec does not own (`page`, `per_page`, ...) are ignored.
pub fn decode<K, V, I>(pairs: I) -> FacetSelection
where
    K: AsRef<str>,
    V: AsRef<str>,
    I: IntoIterator<Item = (K, V)>,
{
    let mut selection = FacetSelection::default();
    for (key, value) in pairs {
        let value = value.as_ref();
        match key.as_ref() {
            CATEGORY_KEY => selection.category = CategoryFilter::parse(value),
            DIFFICULTY_KEY => selection.add_difficulties(value),
            RATING_KEY => selection.add_rating_buckets(value),
            SEARCH_KEY => selection.search_text = value.to_string(),
            SORT_KEY => selection.sort = SortKey::parse(value).unwrap_or_default(),
            _ => {}
        }
    }
    selection
}

/// Renders an encoded map as a percent-encoded query string, keys in
/// [`KEY_ORDER`].
pub fn to_query_string(map: &QueryMap) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for key in KEY_ORDER {
        if let Some(value) = map.get(key) {
            serializer.append_pair(key, value);
        }
    }
    serializer.finish()
}

/// Parses a raw query string (with or without a leading `?`).
pub fn from_query_string(query: &str) -> FacetSelection {
    decode(form_urlencoded::parse(query.trim_start_matches('?').as_bytes()))
}
