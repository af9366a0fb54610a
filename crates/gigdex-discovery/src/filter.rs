//! Facet predicate composition.
//!
//! Each facet is evaluated independently and the results are AND-ed. Values
//! inside a multi-select facet are OR-ed. Unrecognized selection values never
//! match but never raise either.

use gigdex_core::PlatformRecord;

use crate::selection::{CategoryFilter, FacetSelection};

/// Independently toggleable filter dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facet {
    Category,
    Difficulty,
    Rating,
    Search,
}

/// Combined predicate built once per selection and evaluated per record.
#[derive(Debug, Clone)]
pub struct FacetPredicate<'s> {
    selection: &'s FacetSelection,
    needle: String,
}

impl<'s> FacetPredicate<'s> {
    pub fn new(selection: &'s FacetSelection) -> Self {
        Self {
            selection,
            needle: selection.search_text.to_lowercase(),
        }
    }

    pub fn matches(&self, record: &PlatformRecord) -> bool {
        self.category_matches(record)
            && self.difficulty_matches(record)
            && self.rating_matches(record)
            && self.search_matches(record)
    }

    /// Same as [`matches`](Self::matches) but with one facet treated as
    /// unconstrained. Used for facet counts.
    pub fn matches_ignoring(&self, record: &PlatformRecord, ignored: Facet) -> bool {
        (ignored == Facet::Category || self.category_matches(record))
            && (ignored == Facet::Difficulty || self.difficulty_matches(record))
            && (ignored == Facet::Rating || self.rating_matches(record))
            && (ignored == Facet::Search || self.search_matches(record))
    }

    fn category_matches(&self, record: &PlatformRecord) -> bool {
        match &self.selection.category {
            CategoryFilter::All => true,
            CategoryFilter::Only(category) => record.category == *category,
        }
    }

    fn difficulty_matches(&self, record: &PlatformRecord) -> bool {
        let wanted = &self.selection.difficulties;
        wanted.is_empty()
            || (record.difficulty.is_recognized() && wanted.contains(&record.difficulty))
    }

    fn rating_matches(&self, record: &PlatformRecord) -> bool {
        let buckets = &self.selection.rating_buckets;
        buckets.is_empty() || buckets.iter().any(|bucket| bucket.contains(record.rating))
    }

    fn search_matches(&self, record: &PlatformRecord) -> bool {
        self.needle.is_empty()
            || record.name.to_lowercase().contains(&self.needle)
            || record.category.to_lowercase().contains(&self.needle)
    }
}

/// Convenience for one-off checks; build a [`FacetPredicate`] when filtering
/// many records.
pub fn matches(record: &PlatformRecord, selection: &FacetSelection) -> bool {
    FacetPredicate::new(selection).matches(record)
}

#[cfg(test)]
mod tests {
    use gigdex_core::{Difficulty, RatingBucket};

    use super::*;

    fn upwork() -> PlatformRecord {
        PlatformRecord::new("Upwork", "General", 4.6, "Medium")
    }

    #[test]
    fn unconstrained_selection_matches_everything() {
        let selection = FacetSelection::default();
        assert!(matches(&upwork(), &selection));
        assert!(matches(
            &PlatformRecord::new("Odd", "Unknown", 0.0, "Impossible"),
            &selection
        ));
    }

    #[test]
    fn category_match_is_exact_and_case_sensitive() {
        assert!(matches(&upwork(), &FacetSelection::default().with_category("General")));
        assert!(!matches(&upwork(), &FacetSelection::default().with_category("general")));
        assert!(!matches(&upwork(), &FacetSelection::default().with_category("Premium")));
    }

    #[test]
    fn difficulty_values_are_or_ed() {
        let selection = FacetSelection::default()
            .with_difficulty(Difficulty::Easy)
            .with_difficulty(Difficulty::Medium);
        assert!(matches(&upwork(), &selection));
        let hard_only = FacetSelection::default().with_difficulty(Difficulty::Hard);
        assert!(!matches(&upwork(), &hard_only));
    }

    #[test]
    fn unrecognized_difficulty_never_matches() {
        let selection = FacetSelection::default().with_difficulty("Expert");
        let expert = PlatformRecord::new("Niche", "Premium", 4.0, "Expert");
        assert!(!matches(&expert, &selection));
        assert!(!matches(&upwork(), &selection));
    }

    #[test]
    fn unrecognized_bucket_is_excluded_silently() {
        let selection = FacetSelection::default().with_rating_bucket(RatingBucket::parse("5 stars"));
        assert!(!matches(&upwork(), &selection));
        let mixed = selection.with_rating_bucket(RatingBucket::Excellent);
        assert!(matches(&upwork(), &mixed));
    }

    #[test]
    fn search_is_case_insensitive_over_name_and_category() {
        assert!(matches(&upwork(), &FacetSelection::default().with_search("UPW")));
        assert!(matches(&upwork(), &FacetSelection::default().with_search("gener")));
        assert!(!matches(&upwork(), &FacetSelection::default().with_search("fiverr")));
    }

    #[test]
    fn all_facets_must_pass() {
        let selection = FacetSelection::default()
            .with_category("General")
            .with_difficulty(Difficulty::Medium)
            .with_rating_bucket(RatingBucket::Excellent)
            .with_search("up");
        assert!(matches(&upwork(), &selection));
        let wrong_bucket = FacetSelection {
            rating_buckets: [RatingBucket::Good].into_iter().collect(),
            ..selection.clone()
        };
        assert!(!matches(&upwork(), &wrong_bucket));
        assert!(FacetPredicate::new(&wrong_bucket).matches_ignoring(&upwork(), Facet::Rating));
    }
}
