use std::cmp::Ordering;

use gigdex_core::{Difficulty, PlatformRecord};

use crate::selection::SortKey;

/// Comparator for one sort key. Ties compare equal so that a stable sort
/// keeps catalog order.
pub fn compare(a: &PlatformRecord, b: &PlatformRecord, key: SortKey) -> Ordering {
    match key {
        SortKey::ByRatingDesc => b.rating.total_cmp(&a.rating),
        SortKey::ByNameAsc => a.name.cmp(&b.name),
        SortKey::ByDifficultyAsc => difficulty_sort_rank(&a.difficulty).cmp(&difficulty_sort_rank(&b.difficulty)),
    }
}

/// Stable in-place sort.
pub fn sort_records(records: &mut [&PlatformRecord], key: SortKey) {
    records.sort_by(|a, b| compare(a, b, key));
}

// Unrecognized levels sort after every known level.
fn difficulty_sort_rank(difficulty: &Difficulty) -> u8 {
    difficulty.rank().unwrap_or(u8::MAX)
}
