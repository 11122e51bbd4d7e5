use async_trait::async_trait;
use sqlx::Row;

use common::prelude::{
    Account, Artifact, CatalogError, CatalogProvider, Directory, GroupId, StorePath, UserId,
};

use crate::database::Database;

#[async_trait]
impl CatalogProvider for Database {
    type Error = sqlx::Error;

    async fn account_for_token(
        &self,
        secret: &str,
    ) -> Result<Option<Account>, CatalogError<Self::Error>> {
        let row = sqlx::query(
            r#"
            SELECT users.id AS user_id, users.is_active AS is_active
            FROM auth_tokens
            JOIN users ON users.id = auth_tokens.user_id
            WHERE auth_tokens.secret = ?
            "#,
        )
        .bind(secret)
        .fetch_optional(&**self)
        .await
        .map_err(CatalogError::Provider)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let user_id: i64 = row.try_get("user_id").map_err(CatalogError::Provider)?;
        let is_active: bool = row.try_get("is_active").map_err(CatalogError::Provider)?;

        let groups: Vec<i64> =
            sqlx::query_scalar("SELECT group_id FROM user_groups WHERE user_id = ?")
                .bind(user_id)
                .fetch_all(&**self)
                .await
                .map_err(CatalogError::Provider)?;

        Ok(Some(Account::new(
            UserId(user_id),
            is_active,
            groups.into_iter().map(GroupId),
        )))
    }

    async fn directories(&self) -> Result<Vec<Directory>, CatalogError<Self::Error>> {
        let rows = self.directory_rows().await.map_err(CatalogError::Provider)?;
        Ok(rows.iter().filter_map(|row| row.to_directory()).collect())
    }

    async fn artifact(&self, key: &str) -> Result<Option<Artifact>, CatalogError<Self::Error>> {
        let row = sqlx::query("SELECT key, is_permanent, size FROM artifacts WHERE key = ?")
            .bind(key)
            .fetch_optional(&**self)
            .await
            .map_err(CatalogError::Provider)?;

        Ok(row.and_then(|row| artifact_from_row(&row)))
    }

    async fn artifacts_under(
        &self,
        path: &StorePath,
    ) -> Result<Vec<Artifact>, CatalogError<Self::Error>> {
        let rows = if path.is_root() {
            sqlx::query("SELECT key, is_permanent, size FROM artifacts ORDER BY key")
                .fetch_all(&**self)
                .await
        } else {
            // prefix match without LIKE, so `_` and `%` in keys stay literal
            let prefix = format!("{}/", path.key());
            sqlx::query(
                r#"
                SELECT key, is_permanent, size
                FROM artifacts
                WHERE substr(key, 1, ?) = ?
                ORDER BY key
                "#,
            )
            .bind(prefix.chars().count() as i64)
            .bind(&prefix)
            .fetch_all(&**self)
            .await
        }
        .map_err(CatalogError::Provider)?;

        Ok(rows.iter().filter_map(artifact_from_row).collect())
    }
}

fn artifact_from_row(row: &sqlx::sqlite::SqliteRow) -> Option<Artifact> {
    let key: String = row.try_get("key").ok()?;
    let is_permanent: bool = row.try_get("is_permanent").ok()?;
    let size: i64 = row.try_get("size").ok()?;

    match Artifact::new(&key, is_permanent, size.max(0) as u64) {
        Ok(artifact) => Some(artifact),
        Err(e) => {
            tracing::warn!(key = %key, "skipping artifact row: {}", e);
            None
        }
    }
}
