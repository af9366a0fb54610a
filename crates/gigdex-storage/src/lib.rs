//! Catalog snapshot loading for gigdex.
//!
//! A snapshot is the published platform list for one request. It comes from
//! Postgres when a database is configured and has rows, otherwise from the
//! `platforms.yaml` file shipped with the site.
//!
//! The database loader reads a `platforms` table shaped like:
//!
//! ```sql
//! CREATE TABLE platforms (
//!     id          uuid PRIMARY KEY,
//!     slug        text NOT NULL UNIQUE,
//!     name        text NOT NULL,
//!     category    text NOT NULL,
//!     rating      double precision NOT NULL,
//!     difficulty  text NOT NULL,
//!     fees        text,
//!     featured    boolean NOT NULL DEFAULT false,
//!     published   boolean NOT NULL DEFAULT true,
//!     website_url text,
//!     summary     text,
//!     created_at  timestamptz NOT NULL DEFAULT now(),
//!     updated_at  timestamptz
//! );
//! ```
//!
//! Only `published` rows are returned, ordered by `created_at` then `name`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use gigdex_core::{deterministic_platform_id, is_valid_slug, slugify, Difficulty, PlatformRecord};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use sqlx::{
    postgres::{PgPoolOptions, PgRow},
    PgPool, Row,
};
use thiserror::Error;
use tokio::fs;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

pub const CRATE_NAME: &str = "gigdex-storage";

/// How long a load waits for a database connection before using the YAML file.
pub const DB_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("reading catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing catalog yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("database: {0}")]
    Database(#[from] sqlx::Error),
    #[error("platform {name:?} has invalid slug {slug:?}")]
    InvalidSlug { name: String, slug: String },
    #[error("slug {0:?} is used by more than one platform")]
    DuplicateSlug(String),
    #[error("platform {slug:?} has rating {rating} outside 0.0..=5.0")]
    RatingOutOfRange { slug: String, rating: f64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    Database,
    Yaml(PathBuf),
}

/// Validated, read-only catalog for one request.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    records: Vec<PlatformRecord>,
    source: CatalogSource,
    fingerprint: String,
}

impl CatalogSnapshot {
    pub fn from_records(records: Vec<PlatformRecord>, source: CatalogSource) -> Result<Self, CatalogError> {
        validate_records(&records)?;
        let fingerprint = fingerprint_records(&records);
        Ok(Self {
            records,
            source,
            fingerprint,
        })
    }

    pub fn records(&self) -> &[PlatformRecord] {
        &self.records
    }

    pub fn source(&self) -> &CatalogSource {
        &self.source
    }

    /// SHA-256 hex digest of the records, suitable for an `ETag`.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn find_by_slug(&self, slug: &str) -> Option<&PlatformRecord> {
        self.records.iter().find(|r| r.slug == slug)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn fingerprint_records(records: &[PlatformRecord]) -> String {
    // PlatformRecord has no map fields, so serialization order is fixed.
    let bytes = serde_json::to_vec(records).unwrap_or_default();
    sha256_hex(&bytes)
}

pub fn validate_records(records: &[PlatformRecord]) -> Result<(), CatalogError> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        if !is_valid_slug(&record.slug) {
            return Err(CatalogError::InvalidSlug {
                name: record.name.clone(),
                slug: record.slug.clone(),
            });
        }
        if !seen.insert(record.slug.as_str()) {
            return Err(CatalogError::DuplicateSlug(record.slug.clone()));
        }
        if !record.rating.is_finite() || !(0.0..=5.0).contains(&record.rating) {
            return Err(CatalogError::RatingOutOfRange {
                slug: record.slug.clone(),
                rating: record.rating,
            });
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    platforms: Vec<CatalogEntry>,
}

#[derive(Debug, Clone, Deserialize)]
struct CatalogEntry {
    #[serde(default)]
    id: Option<Uuid>,
    #[serde(default)]
    slug: Option<String>,
    name: String,
    category: String,
    rating: f64,
    difficulty: Difficulty,
    #[serde(default)]
    fees: String,
    #[serde(default)]
    featured: bool,
    #[serde(default = "default_published")]
    published: bool,
    #[serde(default)]
    website_url: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

fn default_published() -> bool {
    true
}

impl From<CatalogEntry> for PlatformRecord {
    fn from(entry: CatalogEntry) -> Self {
        let slug = entry.slug.unwrap_or_else(|| slugify(&entry.name));
        Self {
            id: entry.id.unwrap_or_else(|| deterministic_platform_id(&slug)),
            slug,
            name: entry.name,
            category: entry.category,
            rating: entry.rating,
            difficulty: entry.difficulty,
            fees: entry.fees,
            featured: entry.featured,
            website_url: entry.website_url,
            summary: entry.summary,
            updated_at: entry.updated_at,
        }
    }
}

/// Parses a YAML catalog, keeping file order and dropping unpublished entries.
pub fn parse_catalog_yaml(text: &str) -> Result<Vec<PlatformRecord>, CatalogError> {
    let file: CatalogFile = serde_yaml::from_str(text)?;
    Ok(file
        .platforms
        .into_iter()
        .filter(|entry| entry.published)
        .map(PlatformRecord::from)
        .collect())
}

pub async fn load_catalog_file(path: impl AsRef<Path>) -> Result<CatalogSnapshot, CatalogError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).await.map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let records = parse_catalog_yaml(&text)?;
    CatalogSnapshot::from_records(records, CatalogSource::Yaml(path.to_path_buf()))
}

pub async fn load_catalog_from_db(pool: &PgPool) -> Result<Vec<PlatformRecord>, CatalogError> {
    let rows = sqlx::query(
        r#"
        SELECT id, slug, name, category, rating, difficulty, fees, featured,
               website_url, summary, updated_at
          FROM platforms
         WHERE published = true
         ORDER BY created_at, name
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.iter().map(record_from_row).collect()
}

fn record_from_row(row: &PgRow) -> Result<PlatformRecord, CatalogError> {
    let difficulty: String = row.try_get("difficulty")?;
    Ok(PlatformRecord {
        id: row.try_get("id")?,
        slug: row.try_get("slug")?,
        name: row.try_get("name")?,
        category: row.try_get("category")?,
        rating: row.try_get("rating")?,
        difficulty: Difficulty::parse(&difficulty),
        fees: row.try_get::<Option<String>, _>("fees")?.unwrap_or_default(),
        featured: row.try_get("featured")?,
        website_url: row.try_get("website_url")?,
        summary: row.try_get("summary")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Loads catalog snapshots, preferring the database and falling back to the
/// YAML file when the database is unset, unreachable or empty.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    catalog_path: PathBuf,
    pool: Option<PgPool>,
}

impl CatalogStore {
    pub fn new(catalog_path: impl Into<PathBuf>) -> Self {
        Self {
            catalog_path: catalog_path.into(),
            pool: None,
        }
    }

    /// Attaches a lazily connecting pool; nothing is dialed until the first load.
    pub fn with_database_url(self, database_url: &str) -> Result<Self, CatalogError> {
        let pool = PgPoolOptions::new()
            .acquire_timeout(DB_ACQUIRE_TIMEOUT)
            .connect_lazy(database_url)?;
        Ok(self.with_pool(pool))
    }

    pub fn with_pool(mut self, pool: PgPool) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn catalog_path(&self) -> &Path {
        &self.catalog_path
    }

    pub async fn load(&self) -> Result<CatalogSnapshot, CatalogError> {
        let span = info_span!("catalog_load", path = %self.catalog_path.display());
        async {
            if let Some(pool) = &self.pool {
                match load_catalog_from_db(pool).await {
                    Ok(records) if !records.is_empty() => {
                        info!(records = records.len(), "catalog loaded from database");
                        return CatalogSnapshot::from_records(records, CatalogSource::Database);
                    }
                    Ok(_) => warn!("platforms table is empty; falling back to yaml catalog"),
                    Err(err) => warn!(error = %err, "database catalog unavailable; falling back to yaml catalog"),
                }
            }
            let snapshot = load_catalog_file(&self.catalog_path).await?;
            info!(records = snapshot.len(), "catalog loaded from yaml");
            Ok(snapshot)
        }
        .instrument(span)
        .await
    }
}
