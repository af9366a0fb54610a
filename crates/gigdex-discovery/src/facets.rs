use std::collections::BTreeMap;

use gigdex_core::{Difficulty, PlatformRecord, RatingBucket};
use serde::Serialize;

use crate::filter::{Facet, FacetPredicate};
use crate::selection::{CategoryFilter, FacetSelection};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetCount {
    pub value: String,
    pub label: String,
    pub count: usize,
    pub selected: bool,
}

/// Per-value counts for the facet sidebar. Each facet is counted with every
/// *other* active facet applied and its own facet left open, so the numbers
/// show what toggling that value would yield.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetCounts {
    pub categories: Vec<FacetCount>,
    pub difficulties: Vec<FacetCount>,
    pub rating_buckets: Vec<FacetCount>,
}

pub fn facet_counts(catalog: &[PlatformRecord], selection: &FacetSelection) -> FacetCounts {
    let predicate = FacetPredicate::new(selection);

    let mut categories = BTreeMap::<&str, usize>::new();
    for record in catalog {
        let slot = categories.entry(record.category.as_str()).or_default();
        if predicate.matches_ignoring(record, Facet::Category) {
            *slot += 1;
        }
    }
    if let CategoryFilter::Only(selected) = &selection.category {
        categories.entry(selected.as_str()).or_default();
    }
    let categories = categories
        .into_iter()
        .map(|(category, count)| FacetCount {
            value: category.to_string(),
            label: category.to_string(),
            count,
            selected: selection.category.as_str() == category,
        })
        .collect();

    let difficulties = Difficulty::KNOWN
        .into_iter()
        .map(|difficulty| FacetCount {
            value: difficulty.as_str().to_string(),
            label: difficulty.as_str().to_string(),
            count: catalog
                .iter()
                .filter(|r| r.difficulty == difficulty)
                .filter(|r| predicate.matches_ignoring(r, Facet::Difficulty))
                .count(),
            selected: selection.difficulties.contains(&difficulty),
        })
        .collect();

    let rating_buckets = RatingBucket::KNOWN
        .into_iter()
        .map(|bucket| FacetCount {
            value: bucket.id().to_string(),
            label: bucket.label().to_string(),
            count: catalog
                .iter()
                .filter(|r| bucket.contains(r.rating))
                .filter(|r| predicate.matches_ignoring(r, Facet::Rating))
                .count(),
            selected: selection.rating_buckets.contains(&bucket),
        })
        .collect();

    FacetCounts {
        categories,
        difficulties,
        rating_buckets,
    }
}
