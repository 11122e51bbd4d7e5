use clap::Args;

use artifactorial_daemon::config::ConfigError;
use artifactorial_daemon::database::DatabaseSetupError;
use artifactorial_daemon::Database;

/// Validate every stored directory row.
#[derive(Args, Debug, Clone)]
pub struct Check;

#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("database error: {0}")]
    Database(#[from] DatabaseSetupError),

    #[error("query failed: {0}")]
    Query(#[from] sqlx::Error),

    #[error("{count} invalid directory row(s):\n{report}")]
    InvalidRows { count: usize, report: String },
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Check {
    type Error = CheckError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let config = ctx.config()?;
        let database = Database::connect(&config.database_url()?).await?;
        let rows = database.directory_rows().await?;

        let problems: Vec<String> = rows
            .iter()
            .filter_map(|row| {
                row.validate()
                    .err()
                    .map(|e| format!("  #{} {}: {}", row.id, row.path, e))
            })
            .collect();

        if !problems.is_empty() {
            return Err(CheckError::InvalidRows {
                count: problems.len(),
                report: problems.join("\n"),
            });
        }

        Ok(format!("{} directory row(s) ok", rows.len()))
    }
}
