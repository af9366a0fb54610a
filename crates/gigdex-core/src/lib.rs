//! Core domain model for the gigdex platform directory.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const CRATE_NAME: &str = "gigdex-core";

/// Category sentinel: selecting it means the category facet is unconstrained.
pub const ALL_PLATFORMS: &str = "All Platforms";

/// Canonical category strings offered by the directory.
pub const CATEGORIES: &[&str] = &[
    "General",
    "Premium",
    "Development",
    "Design",
    "Writing",
    "Microtasks",
];

/// How hard it is for a new freelancer to get accepted and land work.
///
/// Values that are not one of the three known levels are kept verbatim in
/// [`Difficulty::Unrecognized`] so that nothing read from storage is lost.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Unrecognized(String),
}

impl Difficulty {
    pub const KNOWN: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Case-insensitive parse; never fails.
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.eq_ignore_ascii_case("easy") {
            Difficulty::Easy
        } else if trimmed.eq_ignore_ascii_case("medium") {
            Difficulty::Medium
        } else if trimmed.eq_ignore_ascii_case("hard") {
            Difficulty::Hard
        } else {
            Difficulty::Unrecognized(trimmed.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
            Difficulty::Unrecognized(raw) => raw,
        }
    }

    /// Easy = 1, Medium = 2, Hard = 3; `None` for unrecognized values.
    pub fn rank(&self) -> Option<u8> {
        match self {
            Difficulty::Easy => Some(1),
            Difficulty::Medium => Some(2),
            Difficulty::Hard => Some(3),
            Difficulty::Unrecognized(_) => None,
        }
    }

    pub fn is_recognized(&self) -> bool {
        self.rank().is_some()
    }
}

impl From<String> for Difficulty {
    fn from(value: String) -> Self {
        Difficulty::parse(&value)
    }
}

impl From<&str> for Difficulty {
    fn from(value: &str) -> Self {
        Difficulty::parse(value)
    }
}

impl From<Difficulty> for String {
    fn from(value: Difficulty) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed, non-overlapping rating ranges used by the rating facet.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RatingBucket {
    /// rating >= 4.5
    Excellent,
    /// 4.0 <= rating < 4.5
    VeryGood,
    /// 3.5 <= rating < 4.0
    Good,
    Unrecognized(String),
}

impl RatingBucket {
    pub const KNOWN: [RatingBucket; 3] = [
        RatingBucket::Excellent,
        RatingBucket::VeryGood,
        RatingBucket::Good,
    ];

    /// Accepts the URL-safe identifiers (`4.5+`, `4.0-4.4`, `3.5-3.9`) as well
    /// as the display labels (`≥4.5`, `4.0–4.4`, `3.5–3.9`).
    pub fn parse(input: &str) -> Self {
        match input.trim() {
            "4.5+" | "≥4.5" | ">=4.5" => RatingBucket::Excellent,
            "4.0-4.4" | "4.0–4.4" => RatingBucket::VeryGood,
            "3.5-3.9" | "3.5–3.9" => RatingBucket::Good,
            other => RatingBucket::Unrecognized(other.to_string()),
        }
    }

    /// URL-safe identifier used in query strings.
    pub fn id(&self) -> &str {
        match self {
            RatingBucket::Excellent => "4.5+",
            RatingBucket::VeryGood => "4.0-4.4",
            RatingBucket::Good => "3.5-3.9",
            RatingBucket::Unrecognized(raw) => raw,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            RatingBucket::Excellent => "≥4.5",
            RatingBucket::VeryGood => "4.0–4.4",
            RatingBucket::Good => "3.5–3.9",
            RatingBucket::Unrecognized(raw) => raw,
        }
    }

    /// Half-open `[min, max)` bounds; the top bucket has no upper bound.
    pub fn bounds(&self) -> Option<(f64, Option<f64>)> {
        match self {
            RatingBucket::Excellent => Some((4.5, None)),
            RatingBucket::VeryGood => Some((4.0, Some(4.5))),
            RatingBucket::Good => Some((3.5, Some(4.0))),
            RatingBucket::Unrecognized(_) => None,
        }
    }

    pub fn contains(&self, rating: f64) -> bool {
        match self.bounds() {
            Some((min, Some(max))) => rating >= min && rating < max,
            Some((min, None)) => rating >= min,
            None => false,
        }
    }
}

impl From<String> for RatingBucket {
    fn from(value: String) -> Self {
        RatingBucket::parse(&value)
    }
}

impl From<RatingBucket> for String {
    fn from(value: RatingBucket) -> Self {
        value.id().to_string()
    }
}

impl fmt::Display for RatingBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One reviewed freelance marketplace as published by the directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformRecord {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub category: String,
    pub rating: f64,
    pub difficulty: Difficulty,
    pub fees: String,
    pub featured: bool,
    #[serde(default)]
    pub website_url: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl PlatformRecord {
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        rating: f64,
        difficulty: impl Into<Difficulty>,
    ) -> Self {
        let name = name.into();
        let slug = slugify(&name);
        Self {
            id: deterministic_platform_id(&slug),
            slug,
            name,
            category: category.into(),
            rating,
            difficulty: difficulty.into(),
            fees: String::new(),
            featured: false,
            website_url: None,
            summary: None,
            updated_at: None,
        }
    }

    pub fn with_fees(mut self, fees: impl Into<String>) -> Self {
        self.fees = fees.into();
        self
    }

    pub fn with_featured(mut self, featured: bool) -> Self {
        self.featured = featured;
        self
    }

    pub fn rating_bucket(&self) -> Option<RatingBucket> {
        RatingBucket::KNOWN
            .into_iter()
            .find(|bucket| bucket.contains(self.rating))
    }
}

/// Stable identifier for records that arrive without one (e.g. YAML snapshots).
pub fn deterministic_platform_id(slug: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, format!("gigdex:platform:{slug}").as_bytes())
}

/// Lowercase ASCII alphanumerics separated by single hyphens.
pub fn slugify(input: &str) -> String {
    input
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty() && slugify(slug) == slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_parse_is_lenient_and_keeps_unknown_values() {
        assert_eq!(Difficulty::parse(" easy "), Difficulty::Easy);
        assert_eq!(Difficulty::parse("HARD"), Difficulty::Hard);
        assert_eq!(
            Difficulty::parse("Expert"),
            Difficulty::Unrecognized("Expert".into())
        );
        assert_eq!(Difficulty::parse("Expert").rank(), None);
        assert_eq!(Difficulty::Medium.rank(), Some(2));
    }

    #[test]
    fn bucket_boundaries_are_half_open() {
        assert!(RatingBucket::Excellent.contains(4.5));
        assert!(!RatingBucket::VeryGood.contains(4.5));
        assert!(RatingBucket::VeryGood.contains(4.0));
        assert!(!RatingBucket::Good.contains(4.0));
        assert!(RatingBucket::Good.contains(3.5));
        assert!(!RatingBucket::Good.contains(3.49));
        assert!(!RatingBucket::parse("2.0-2.9").contains(2.5));
    }

    #[test]
    fn bucket_parse_accepts_display_labels() {
        for bucket in RatingBucket::KNOWN {
            assert_eq!(RatingBucket::parse(bucket.id()), bucket);
            assert_eq!(RatingBucket::parse(bucket.label()), bucket);
        }
    }

    #[test]
    fn record_rating_bucket_picks_single_range() {
        assert_eq!(
            PlatformRecord::new("Toptal", "Premium", 4.8, "Hard").rating_bucket(),
            Some(RatingBucket::Excellent)
        );
        assert_eq!(
            PlatformRecord::new("Tiny", "General", 2.1, "Easy").rating_bucket(),
            None
        );
    }

    #[test]
    fn slugs_are_url_safe() {
        assert_eq!(slugify("Freelancer.com"), "freelancer-com");
        assert_eq!(slugify("  99 Designs!! "), "99-designs");
        assert!(is_valid_slug("people-per-hour"));
        assert!(!is_valid_slug("People Per Hour"));
        assert!(!is_valid_slug("double--hyphen"));
        assert!(!is_valid_slug(""));
    }

    #[test]
    fn record_serde_uses_plain_strings_for_enums() {
        let record = PlatformRecord::new("Upwork", "General", 4.6, "Medium");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["difficulty"], "Medium");
        assert_eq!(json["slug"], "upwork");
        let back: PlatformRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
        assert_eq!(back.id, deterministic_platform_id("upwork"));
    }
}
