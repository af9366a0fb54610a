use std::path::PathBuf;

use gigdex_discovery::DEFAULT_PER_PAGE;
use gigdex_storage::{CatalogError, CatalogStore};

/// Web settings read once from the environment.
///
/// - `DATABASE_URL`: optional Postgres catalog source
/// - `GIGDEX_WEB_PORT`: listen port (default 8000)
/// - `GIGDEX_WORKSPACE_ROOT`: directory holding `platforms.yaml` and `assets/` (default `.`)
/// - `GIGDEX_CATALOG_PATH`: YAML catalog (default `<root>/platforms.yaml`)
/// - `GIGDEX_PER_PAGE`: table page size (default 20)
#[derive(Debug, Clone)]
pub struct WebConfig {
    pub port: u16,
    pub database_url: Option<String>,
    pub workspace_root: PathBuf,
    pub catalog_path: PathBuf,
    pub per_page: usize,
}

impl WebConfig {
    pub fn from_env() -> Self {
        let workspace_root = std::env::var("GIGDEX_WORKSPACE_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));
        let catalog_path = std::env::var("GIGDEX_CATALOG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| workspace_root.join("platforms.yaml"));
        Self {
            port: std::env::var("GIGDEX_WEB_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8000),
            database_url: std::env::var("DATABASE_URL").ok().filter(|v| !v.trim().is_empty()),
            workspace_root,
            catalog_path,
            per_page: std::env::var("GIGDEX_PER_PAGE")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(DEFAULT_PER_PAGE),
        }
    }

    /// Defaults rooted at `workspace_root`, YAML catalog only.
    pub fn for_workspace(workspace_root: impl Into<PathBuf>) -> Self {
        let workspace_root = workspace_root.into();
        Self {
            port: 8000,
            database_url: None,
            catalog_path: workspace_root.join("platforms.yaml"),
            workspace_root,
            per_page: DEFAULT_PER_PAGE,
        }
    }

    /// Catalog store for this configuration; attaches Postgres when `DATABASE_URL` is set.
    pub fn catalog_store(&self) -> Result<CatalogStore, CatalogError> {
        let store = CatalogStore::new(self.catalog_path.clone());
        match &self.database_url {
            Some(url) => store.with_database_url(url),
            None => Ok(store),
        }
    }
}
