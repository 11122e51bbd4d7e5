use std::path::PathBuf;

use common::prelude::{BlobStore, Catalog, CatalogError};

use crate::config::{Config, ConfigError};
use crate::database::{Database, DatabaseSetupError};

/// Shared service state, cloned into every request.
#[derive(Clone, Debug)]
pub struct State {
    catalog: Catalog<Database>,
    blobs: BlobStore,
    database: Database,
}

impl State {
    pub async fn from_config(config: &Config) -> Result<Self, StateSetupError> {
        // 1. Setup database
        let database_url = config.database_url()?;
        if let Some(parent) = sqlite_parent_dir(&database_url) {
            std::fs::create_dir_all(&parent)?;
        }
        tracing::info!("Database URL: {}", database_url);
        let database = Database::connect(&database_url).await?;

        // 2. Setup blob store
        let blob_root = config.blob_root()?;
        if !blob_root.is_dir() {
            return Err(StateSetupError::BlobRootDoesNotExist(blob_root));
        }
        tracing::info!(blob_root = %blob_root.display(), "serving artifacts");
        let blobs = BlobStore::new(blob_root).with_chunk_size(config.chunk_size);

        Self::new(database, blobs).await
    }

    /// Build state over an already connected database, loading the first
    /// directory index.
    pub async fn new(database: Database, blobs: BlobStore) -> Result<Self, StateSetupError> {
        let catalog = Catalog::load(database.clone()).await?;
        tracing::info!(directories = catalog.index().len(), "catalog loaded");

        Ok(Self {
            catalog,
            blobs,
            database,
        })
    }

    pub fn catalog(&self) -> &Catalog<Database> {
        &self.catalog
    }

    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    pub fn database(&self) -> &Database {
        &self.database
    }
}

fn sqlite_parent_dir(url: &url::Url) -> Option<PathBuf> {
    if url.scheme() != "sqlite" || url.as_str().contains(":memory:") {
        return None;
    }
    let path = url.to_file_path().ok()?;
    path.parent().map(|p| p.to_path_buf())
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to setup the database: {0}")]
    DatabaseSetup(#[from] DatabaseSetupError),

    #[error("failed to load the catalog: {0}")]
    Catalog(#[from] CatalogError<sqlx::Error>),

    #[error("blob root does not exist: {0}")]
    BlobRootDoesNotExist(PathBuf),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
