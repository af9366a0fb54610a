//! Platform discovery: faceted filtering, sorting and shareable view state
//! over an in-memory catalog snapshot.
//!
//! Everything here is a pure function of `(catalog, selection)`. The catalog
//! is loaded once per request by `gigdex-storage`; changing the selection
//! never re-fetches it.

use std::collections::HashSet;

use gigdex_core::PlatformRecord;
use serde::Serialize;
use tracing::debug;

pub mod codec;
pub mod facets;
pub mod filter;
pub mod selection;
pub mod sort;

pub use codec::{decode, encode, from_query_string, to_query_string, QueryMap};
pub use facets::{facet_counts, FacetCount, FacetCounts};
pub use filter::{matches, Facet, FacetPredicate};
pub use selection::{CategoryFilter, FacetSelection, SortKey};
pub use sort::sort_records;

pub const CRATE_NAME: &str = "gigdex-discovery";

pub const DEFAULT_PER_PAGE: usize = 20;

/// Ordered records satisfying a selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilteredResult<'a> {
    pub count: usize,
    pub records: Vec<&'a PlatformRecord>,
}

impl<'a> FilteredResult<'a> {
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a PlatformRecord> + '_ {
        self.records.iter().copied()
    }

    pub fn to_owned_records(&self) -> Vec<PlatformRecord> {
        self.iter().cloned().collect()
    }
}

/// Filters the catalog with the selection's facets, then applies its sort.
pub fn discover<'a>(catalog: &'a [PlatformRecord], selection: &FacetSelection) -> FilteredResult<'a> {
    let predicate = FacetPredicate::new(selection);
    let mut records = catalog
        .iter()
        .filter(|record| predicate.matches(record))
        .collect::<Vec<_>>();
    sort_records(&mut records, selection.sort);
    debug!(
        catalog = catalog.len(),
        matched = records.len(),
        sort = selection.sort.as_str(),
        "discover"
    );
    FilteredResult {
        count: records.len(),
        records,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

/// 1-based pagination; out-of-range pages clamp to the nearest valid page.
/// An empty input still has one (empty) page.
pub fn paginate<T: Clone>(items: &[T], page: Option<usize>, per_page: Option<usize>) -> Page<T> {
    let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE).max(1);
    let total_pages = items.len().max(1).div_ceil(per_page);
    let page = page.unwrap_or(1).clamp(1, total_pages);
    let start = (page - 1) * per_page;
    Page {
        items: items.iter().skip(start).take(per_page).cloned().collect(),
        page,
        per_page,
        total_pages,
        total_items: items.len(),
    }
}

/// Featured platforms, highest rated first.
pub fn featured(catalog: &[PlatformRecord]) -> Vec<&PlatformRecord> {
    let mut records = catalog.iter().filter(|r| r.featured).collect::<Vec<_>>();
    sort_records(&mut records, SortKey::ByRatingDesc);
    records
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison<'a> {
    pub platforms: Vec<&'a PlatformRecord>,
    pub missing: Vec<String>,
}

/// Looks up platforms by slug for a side-by-side view, in the order asked.
/// Repeated slugs are shown once; unknown slugs are reported, not fatal.
pub fn compare<'a, S: AsRef<str>>(catalog: &'a [PlatformRecord], slugs: &[S]) -> Comparison<'a> {
    let mut seen = HashSet::new();
    let mut platforms = Vec::new();
    let mut missing = Vec::new();
    for slug in slugs {
        let slug = slug.as_ref().trim();
        if slug.is_empty() || !seen.insert(slug) {
            continue;
        }
        match catalog.iter().find(|r| r.slug == slug) {
            Some(record) => platforms.push(record),
            None => missing.push(slug.to_string()),
        }
    }
    Comparison { platforms, missing }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<PlatformRecord> {
        vec![
            PlatformRecord::new("Upwork", "General", 4.6, "Medium").with_featured(true),
            PlatformRecord::new("Fiverr", "General", 4.2, "Easy"),
            PlatformRecord::new("Toptal", "Premium", 4.8, "Hard").with_featured(true),
        ]
    }

    #[test]
    fn pagination_clamps_page() {
        let items = (1..=45).collect::<Vec<_>>();
        let page = paginate(&items, Some(9), Some(20));
        assert_eq!(page.page, 3);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items, (41..=45).collect::<Vec<_>>());

        let first = paginate(&items, Some(0), None);
        assert_eq!(first.page, 1);
        assert_eq!(first.items.len(), DEFAULT_PER_PAGE);

        let empty = paginate::<u8>(&[], None, Some(0));
        assert_eq!(empty.total_pages, 1);
        assert_eq!(empty.per_page, 1);
        assert!(empty.items.is_empty());
    }

    #[test]
    fn featured_orders_by_rating() {
        let catalog = catalog();
        let names = featured(&catalog).iter().map(|r| r.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["Toptal", "Upwork"]);
    }

    #[test]
    fn compare_keeps_request_order_and_reports_missing() {
        let catalog = catalog();
        let result = compare(&catalog, &["toptal", "nope", "upwork", "toptal", ""]);
        let names = result.platforms.iter().map(|r| r.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["Toptal", "Upwork"]);
        assert_eq!(result.missing, ["nope"]);
    }

    #[test]
    fn api_payload_serializes_selection_and_result_as_plain_strings() {
        let catalog = catalog();
        let selection = FacetSelection::default()
            .with_category("General")
            .with_difficulty("Easy")
            .with_rating_bucket(gigdex_core::RatingBucket::VeryGood);
        let result = discover(&catalog, &selection);

        let json = serde_json::to_value(&selection).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "category": "General",
                "difficulties": ["Easy"],
                "rating_buckets": ["4.0-4.4"],
                "search_text": "",
                "sort": "by-rating-desc",
            })
        );

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["count"], 1);
        assert_eq!(json["records"][0]["slug"], "fiverr");
        assert_eq!(json["records"][0]["difficulty"], "Easy");
    }
}
