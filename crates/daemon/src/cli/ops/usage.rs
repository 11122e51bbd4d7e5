use clap::Args;

use artifactorial_daemon::config::ConfigError;
use artifactorial_daemon::database::DatabaseSetupError;
use artifactorial_daemon::Database;
use common::prelude::{Catalog, CatalogError, PathError, StorePath};

/// Print the total size of every artifact below a path, visible or not.
#[derive(Args, Debug, Clone)]
pub struct Usage {
    /// Store path, e.g. /pub/debian
    pub path: String,
}

#[derive(Debug, thiserror::Error)]
pub enum UsageError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("database error: {0}")]
    Database(#[from] DatabaseSetupError),

    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError<sqlx::Error>),

    #[error("invalid path: {0}")]
    Path(#[from] PathError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Usage {
    type Error = UsageError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let config = ctx.config()?;
        let path = StorePath::parse(&self.path)?;
        let database = Database::connect(&config.database_url()?).await?;
        let catalog = Catalog::load(database).await?;

        let bytes = catalog.usage(&path).await?;
        Ok(format!("{}\t{}", bytes, path))
    }
}
