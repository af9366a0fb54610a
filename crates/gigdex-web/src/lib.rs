//! Axum + Askama public site for the gigdex platform directory.

use std::path::PathBuf;
use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Path as AxumPath, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use gigdex_core::{PlatformRecord, RatingBucket};
use gigdex_discovery::{
    compare, decode, discover, encode, facet_counts, featured, paginate, to_query_string,
    CategoryFilter, FacetCount, FacetSelection, SortKey,
};
use gigdex_storage::{sha256_hex, CatalogStore};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

mod config;

pub use config::WebConfig;

pub const CRATE_NAME: &str = "gigdex-web";

const MAX_COMPARE: usize = 4;

#[derive(Clone)]
pub struct AppState {
    pub workspace_root: PathBuf,
    pub store: CatalogStore,
    pub per_page: usize,
}

impl AppState {
    /// YAML-only state rooted at `workspace_root`.
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        let config = WebConfig::for_workspace(workspace_root);
        Self {
            store: CatalogStore::new(config.catalog_path),
            workspace_root: config.workspace_root,
            per_page: config.per_page,
        }
    }

    pub fn from_config(config: &WebConfig) -> anyhow::Result<Self> {
        Ok(Self {
            workspace_root: config.workspace_root.clone(),
            store: config.catalog_store()?,
            per_page: config.per_page,
        })
    }
}

/// Display-ready projection of a [`PlatformRecord`].
#[derive(Debug, Clone, Serialize)]
pub struct PlatformRow {
    pub slug: String,
    pub name: String,
    pub category: String,
    pub rating_text: String,
    pub bucket_label: String,
    pub difficulty: String,
    pub fees: String,
    pub featured: bool,
    pub website_url: String,
    pub summary: String,
}

impl From<&PlatformRecord> for PlatformRow {
    fn from(record: &PlatformRecord) -> Self {
        Self {
            slug: record.slug.clone(),
            name: record.name.clone(),
            category: record.category.clone(),
            rating_text: format!("{:.1}", record.rating),
            bucket_label: record
                .rating_bucket()
                .map(|b| b.label().to_string())
                .unwrap_or_else(|| "below 3.5".to_string()),
            difficulty: record.difficulty.to_string(),
            fees: if record.fees.is_empty() {
                "n/a".to_string()
            } else {
                record.fees.clone()
            },
            featured: record.featured,
            website_url: record.website_url.clone().unwrap_or_default(),
            summary: record.summary.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone)]
struct FacetLink {
    label: String,
    count: usize,
    selected: bool,
    href: String,
}

#[derive(Debug, Clone)]
struct SortOption {
    value: String,
    label: String,
    selected: bool,
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    total_platforms: usize,
    total_categories: usize,
    featured: Vec<PlatformRow>,
    categories: Vec<FacetLink>,
}

#[derive(Template)]
#[template(path = "platforms.html")]
struct PlatformsPageTemplate {
    query: String,
    page: usize,
    search_text: String,
    category_label: String,
    hidden_fields: Vec<(String, String)>,
    sort_options: Vec<SortOption>,
}

#[derive(Template)]
#[template(path = "platforms_table_partial.html")]
struct PlatformsTablePartialTemplate {
    platforms: Vec<PlatformRow>,
    count: usize,
    page: usize,
    total_pages: usize,
    prev_href: String,
    next_href: String,
}

#[derive(Template)]
#[template(path = "platforms_facets_partial.html")]
struct PlatformsFacetsPartialTemplate {
    categories: Vec<FacetLink>,
    difficulties: Vec<FacetLink>,
    rating_buckets: Vec<FacetLink>,
    all_selected: bool,
    all_href: String,
}

#[derive(Template)]
#[template(path = "platform_detail.html")]
struct PlatformDetailTemplate {
    platform: PlatformRow,
    similar: Vec<PlatformRow>,
    category_href: String,
}

#[derive(Template)]
#[template(path = "compare.html")]
struct CompareTemplate {
    platforms: Vec<PlatformRow>,
    missing: Vec<String>,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/platforms", get(platforms_page_handler))
        .route("/platforms/table", get(platforms_table_handler))
        .route("/platforms/facets", get(platforms_facets_handler))
        .route("/platforms/{slug}", get(platform_detail_handler))
        .route("/compare", get(compare_handler))
        .route("/api/platforms", get(api_platforms_handler))
        .route("/health", get(health_handler))
        .route("/assets/static/app.css", get(app_css_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

pub async fn serve(config: WebConfig) -> anyhow::Result<()> {
    let state = AppState::from_config(&config)?;
    let listener = TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!(port = config.port, catalog = %config.catalog_path.display(), "gigdex web listening");
    axum::serve(listener, app(state)).await?;
    Ok(())
}

type QueryPairs = Vec<(String, String)>;

fn selection_from(pairs: &QueryPairs) -> FacetSelection {
    decode(pairs.iter().map(|(k, v)| (k, v)))
}

fn last_usize(pairs: &QueryPairs, key: &str) -> Option<usize> {
    pairs
        .iter()
        .rev()
        .find(|(k, _)| k == key)
        .and_then(|(_, v)| v.trim().parse().ok())
}

fn selection_query(selection: &FacetSelection) -> String {
    to_query_string(&encode(selection))
}

fn platforms_href(selection: &FacetSelection) -> String {
    format!("/platforms?{}", selection_query(selection))
}

async fn index_handler(State(state): State<Arc<AppState>>) -> Response {
    match state.store.load().await {
        Ok(snapshot) => {
            let counts = facet_counts(snapshot.records(), &FacetSelection::default());
            let categories = counts
                .categories
                .iter()
                .map(|row| FacetLink {
                    label: row.label.clone(),
                    count: row.count,
                    selected: false,
                    href: platforms_href(&FacetSelection::default().with_category(&row.value)),
                })
                .collect::<Vec<_>>();
            render_html(IndexTemplate {
                total_platforms: snapshot.len(),
                total_categories: categories.len(),
                featured: featured(snapshot.records())
                    .into_iter()
                    .map(PlatformRow::from)
                    .collect(),
                categories,
            })
        }
        Err(err) => server_error(err.into()),
    }
}

async fn platforms_page_handler(Query(pairs): Query<QueryPairs>) -> Response {
    let selection = selection_from(&pairs);
    let encoded = encode(&selection);
    let hidden_fields = encoded
        .iter()
        .filter(|(k, _)| k.as_str() != "q" && k.as_str() != "sort")
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    let sort_options = SortKey::ALL
        .into_iter()
        .map(|key| SortOption {
            value: key.as_str().to_string(),
            label: key.label().to_string(),
            selected: key == selection.sort,
        })
        .collect();
    render_html(PlatformsPageTemplate {
        query: to_query_string(&encoded),
        page: last_usize(&pairs, "page").unwrap_or(1).max(1),
        search_text: selection.search_text.clone(),
        category_label: selection.category.as_str().to_string(),
        hidden_fields,
        sort_options,
    })
}

async fn platforms_table_handler(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<QueryPairs>,
) -> Response {
    match state.store.load().await {
        Ok(snapshot) => {
            let selection = selection_from(&pairs);
            let result = discover(snapshot.records(), &selection);
            let page = paginate(
                &result.records,
                last_usize(&pairs, "page"),
                last_usize(&pairs, "per_page").or(Some(state.per_page)),
            );
            let query = selection_query(&selection);
            let page_href = |n: usize| format!("/platforms?{query}&page={n}");
            let mut resp = render_html(PlatformsTablePartialTemplate {
                platforms: page.items.iter().copied().map(PlatformRow::from).collect(),
                count: result.count,
                page: page.page,
                total_pages: page.total_pages,
                prev_href: if page.page > 1 { page_href(page.page - 1) } else { String::new() },
                next_href: if page.page < page.total_pages {
                    page_href(page.page + 1)
                } else {
                    String::new()
                },
            });
            resp.headers_mut().insert(
                header::HeaderName::from_static("hx-trigger"),
                header::HeaderValue::from_static("platformsTableLoaded"),
            );
            resp
        }
        Err(err) => server_error(err.into()),
    }
}

async fn platforms_facets_handler(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<QueryPairs>,
) -> Response {
    match state.store.load().await {
        Ok(snapshot) => {
            let selection = selection_from(&pairs);
            let counts = facet_counts(snapshot.records(), &selection);

            let categories = counts
                .categories
                .iter()
                .map(|row| {
                    let next = FacetSelection {
                        category: if row.selected {
                            CategoryFilter::All
                        } else {
                            CategoryFilter::parse(&row.value)
                        },
                        ..selection.clone()
                    };
                    facet_link(row, &next)
                })
                .collect();
            let difficulties = counts
                .difficulties
                .iter()
                .map(|row| {
                    let mut next = selection.clone();
                    let value = gigdex_core::Difficulty::parse(&row.value);
                    if !next.difficulties.remove(&value) {
                        next.difficulties.insert(value);
                    }
                    facet_link(row, &next)
                })
                .collect();
            let rating_buckets = counts
                .rating_buckets
                .iter()
                .map(|row| {
                    let mut next = selection.clone();
                    let value = RatingBucket::parse(&row.value);
                    if !next.rating_buckets.remove(&value) {
                        next.rating_buckets.insert(value);
                    }
                    facet_link(row, &next)
                })
                .collect();

            let all = FacetSelection {
                category: CategoryFilter::All,
                ..selection.clone()
            };
            render_html(PlatformsFacetsPartialTemplate {
                categories,
                difficulties,
                rating_buckets,
                all_selected: selection.category.is_all(),
                all_href: platforms_href(&all),
            })
        }
        Err(err) => server_error(err.into()),
    }
}

fn facet_link(row: &FacetCount, next: &FacetSelection) -> FacetLink {
    FacetLink {
        label: row.label.clone(),
        count: row.count,
        selected: row.selected,
        href: platforms_href(next),
    }
}

async fn platform_detail_handler(
    State(state): State<Arc<AppState>>,
    AxumPath(slug): AxumPath<String>,
) -> Response {
    match state.store.load().await {
        Ok(snapshot) => {
            let Some(record) = snapshot.find_by_slug(&slug) else {
                return (StatusCode::NOT_FOUND, Html("Platform not found".to_string())).into_response();
            };
            let same_category = FacetSelection::default().with_category(&record.category);
            let similar = discover(snapshot.records(), &same_category)
                .iter()
                .filter(|r| r.slug != record.slug)
                .take(3)
                .map(PlatformRow::from)
                .collect();
            render_html(PlatformDetailTemplate {
                platform: PlatformRow::from(record),
                similar,
                category_href: platforms_href(&same_category),
            })
        }
        Err(err) => server_error(err.into()),
    }
}

async fn compare_handler(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<QueryPairs>,
) -> Response {
    let slugs = pairs
        .iter()
        .filter(|(k, _)| k == "slugs" || k == "slug")
        .flat_map(|(_, v)| v.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>();
    match state.store.load().await {
        Ok(snapshot) => {
            let comparison = compare(snapshot.records(), &slugs);
            render_html(CompareTemplate {
                platforms: comparison
                    .platforms
                    .into_iter()
                    .take(MAX_COMPARE)
                    .map(PlatformRow::from)
                    .collect(),
                missing: comparison.missing,
            })
        }
        Err(err) => server_error(err.into()),
    }
}

async fn api_platforms_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(pairs): Query<QueryPairs>,
) -> Response {
    match state.store.load().await {
        Ok(snapshot) => {
            let selection = selection_from(&pairs);
            let query = selection_query(&selection);
            let etag = format!(
                "\"{}\"",
                sha256_hex(format!("{}?{}", snapshot.fingerprint(), query).as_bytes())
            );
            let cached = headers
                .get(header::IF_NONE_MATCH)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v == etag);
            if cached {
                return (StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response();
            }

            let result = discover(snapshot.records(), &selection);
            let facets = facet_counts(snapshot.records(), &selection);
            let body = serde_json::json!({
                "count": result.count,
                "query": query,
                "selection": selection,
                "facets": facets,
                "platforms": result.records,
            });
            ([(header::ETAG, etag)], Json(body)).into_response()
        }
        Err(err) => server_error(err.into()),
    }
}

async fn health_handler() -> &'static str {
    "ok"
}

async fn app_css_handler(State(state): State<Arc<AppState>>) -> Response {
    let css_path = state.workspace_root.join("assets/static/app.css");
    match tokio::fs::read_to_string(&css_path).await {
        Ok(css) => ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], css).into_response(),
        Err(_) => (StatusCode::NOT_FOUND, Html("/* missing app.css */".to_string())).into_response(),
    }
}

fn render_html<T: Template>(tpl: T) -> Response {
    match tpl.render() {
        Ok(html) => Html(html).into_response(),
        Err(err) => server_error(anyhow::anyhow!(err.to_string())),
    }
}

fn server_error(err: anyhow::Error) -> Response {
    tracing::error!(error = %err, "request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html(format!("Server error: {}", err)),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http_body_util::BodyExt;
    use std::path::Path;
    use tower::ServiceExt;

    fn workspace_root() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../..")
            .canonicalize()
            .unwrap()
    }

    async fn get(uri: &str) -> (StatusCode, HeaderMap, String) {
        let app = app(AppState::new(workspace_root()));
        let resp = app
            .oneshot(axum::http::Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        (status, headers, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn handler_smoke_get_index() {
        let (status, _, text) = get("/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(text.contains("gigdex"));
        assert!(text.contains("Toptal"));
    }

    #[tokio::test]
    async fn table_partial_applies_category_facet() {
        let (status, headers, text) = get("/platforms/table?category=General").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers["hx-trigger"], "platformsTableLoaded");
        assert!(text.contains("Upwork"));
        assert!(text.contains("Fiverr"));
        assert!(!text.contains("Toptal"));
    }

    #[tokio::test]
    async fn facets_partial_renders() {
        let (status, _, text) = get("/platforms/facets?difficulty=Easy").await;
        assert_eq!(status, StatusCode::OK);
        assert!(text.contains("Medium"));
        assert!(text.contains("4.0–4.4"));
    }

    #[tokio::test]
    async fn page_shell_carries_selection() {
        let (status, _, text) = get("/platforms?q=top&sort=name").await;
        assert_eq!(status, StatusCode::OK);
        assert!(text.contains("q=top&amp;sort=name"));
    }

    #[tokio::test]
    async fn detail_and_missing_platform() {
        let (status, _, text) = get("/platforms/upwork").await;
        assert_eq!(status, StatusCode::OK);
        assert!(text.contains("Upwork"));

        let (status, _, _) = get("/platforms/not-a-platform").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn compare_lists_known_and_missing_slugs() {
        let (status, _, text) = get("/compare?slugs=toptal,upwork,ghost").await;
        assert_eq!(status, StatusCode::OK);
        assert!(text.contains("Toptal"));
        assert!(text.contains("Upwork"));
        assert!(text.contains("ghost"));
    }

    #[tokio::test]
    async fn api_returns_json_with_etag() {
        let (status, headers, text) = get("/api/platforms?rating=4.0-4.4&category=General").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE].to_str().unwrap(), "application/json");
        assert!(headers.contains_key(header::ETAG));
        let body: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(body["query"], "category=General&rating=4.0-4.4&sort=rating");
        let names = body["platforms"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["name"].as_str().unwrap().to_string())
            .collect::<Vec<_>>();
        assert!(names.contains(&"Fiverr".to_string()));
        assert!(!names.contains(&"Upwork".to_string()));
        assert_eq!(body["count"].as_u64().unwrap() as usize, names.len());
    }

    #[tokio::test]
    async fn api_honours_if_none_match() {
        let (_, headers, _) = get("/api/platforms").await;
        let etag = headers[header::ETAG].clone();
        let resp = app(AppState::new(workspace_root()))
            .oneshot(
                axum::http::Request::builder()
                    .uri("/api/platforms")
                    .header(header::IF_NONE_MATCH, etag)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_MODIFIED);
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (status, _, text) = get("/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(text, "ok");
    }
}
