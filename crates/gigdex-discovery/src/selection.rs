use std::collections::BTreeSet;

use gigdex_core::{Difficulty, RatingBucket, ALL_PLATFORMS};
use serde::{Deserialize, Serialize};

/// Category facet: either unconstrained or one exact canonical category.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CategoryFilter {
    #[default]
    All,
    Only(String),
}

impl CategoryFilter {
    /// Empty input and the "All Platforms" sentinel both mean unconstrained.
    pub fn parse(input: &str) -> Self {
        if input.is_empty() || input == ALL_PLATFORMS {
            CategoryFilter::All
        } else {
            CategoryFilter::Only(input.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            CategoryFilter::All => ALL_PLATFORMS,
            CategoryFilter::Only(category) => category,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, CategoryFilter::All)
    }
}

impl From<String> for CategoryFilter {
    fn from(value: String) -> Self {
        CategoryFilter::parse(&value)
    }
}

impl From<CategoryFilter> for String {
    fn from(value: CategoryFilter) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    #[default]
    ByRatingDesc,
    ByNameAsc,
    ByDifficultyAsc,
}

impl SortKey {
    pub const ALL: [SortKey; 3] = [SortKey::ByRatingDesc, SortKey::ByNameAsc, SortKey::ByDifficultyAsc];

    /// Short name used in query strings.
    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::ByRatingDesc => "rating",
            SortKey::ByNameAsc => "name",
            SortKey::ByDifficultyAsc => "difficulty",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortKey::ByRatingDesc => "Highest rated",
            SortKey::ByNameAsc => "Name (A-Z)",
            SortKey::ByDifficultyAsc => "Easiest first",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "rating" | "by-rating-desc" => Some(SortKey::ByRatingDesc),
            "name" | "by-name-asc" => Some(SortKey::ByNameAsc),
            "difficulty" | "by-difficulty-asc" => Some(SortKey::ByDifficultyAsc),
            _ => None,
        }
    }
}

/// The visitor's current filter and sort intent.
///
/// Every facet at its empty value (sentinel category, empty sets, empty
/// search text) places no constraint on the catalog.
///
/// Multi-select values are stored split on `,`, trimmed, and never empty, so
/// the builders, deserialization and the query-string codec all agree on what
/// a selection holds.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "SelectionFields")]
pub struct FacetSelection {
    pub category: CategoryFilter,
    pub difficulties: BTreeSet<Difficulty>,
    pub rating_buckets: BTreeSet<RatingBucket>,
    pub search_text: String,
    pub sort: SortKey,
}

/// Wire form accepted when deserializing a [`FacetSelection`].
#[derive(Default, Deserialize)]
#[serde(default)]
struct SelectionFields {
    category: CategoryFilter,
    difficulties: Vec<String>,
    rating_buckets: Vec<String>,
    search_text: String,
    sort: SortKey,
}

impl From<SelectionFields> for FacetSelection {
    fn from(fields: SelectionFields) -> Self {
        let mut selection = FacetSelection {
            category: fields.category,
            search_text: fields.search_text,
            sort: fields.sort,
            ..FacetSelection::default()
        };
        for value in &fields.difficulties {
            selection.add_difficulties(value);
        }
        for value in &fields.rating_buckets {
            selection.add_rating_buckets(value);
        }
        selection
    }
}

impl FacetSelection {
    pub fn with_category(self, category: &str) -> Self {
        Self {
            category: CategoryFilter::parse(category),
            ..self
        }
    }

    /// Adds one difficulty, or several when the value is a comma list.
    /// Blank values add nothing.
    pub fn with_difficulty(mut self, difficulty: impl Into<Difficulty>) -> Self {
        self.add_difficulties(difficulty.into().as_str());
        self
    }

    /// Adds a rating bucket with the same splitting as [`Self::with_difficulty`].
    pub fn with_rating_bucket(mut self, bucket: RatingBucket) -> Self {
        self.add_rating_buckets(bucket.id());
        self
    }

    pub(crate) fn add_difficulties(&mut self, value: &str) {
        self.difficulties
            .extend(split_list(value).map(Difficulty::parse));
    }

    pub(crate) fn add_rating_buckets(&mut self, value: &str) {
        self.rating_buckets
            .extend(split_list(value).map(RatingBucket::parse));
    }

    pub fn with_search(self, search_text: impl Into<String>) -> Self {
        Self {
            search_text: search_text.into(),
            ..self
        }
    }

    pub fn with_sort(self, sort: SortKey) -> Self {
        Self { sort, ..self }
    }

    /// True when no facet constrains the catalog; the sort key is ignored.
    pub fn is_unconstrained(&self) -> bool {
        self.category.is_all()
            && self.difficulties.is_empty()
            && self.rating_buckets.is_empty()
            && self.search_text.is_empty()
    }
}

/// Trimmed, non-empty items of a comma-separated facet value.
pub(crate) fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|item| !item.is_empty())
}
