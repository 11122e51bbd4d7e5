//! Writes and raw reads of catalog rows.
//!
//! The daemon itself never writes; these exist for provisioning scripts,
//! the `check` command and tests.

use chrono::{DateTime, Utc};
use sqlx::Row;

use common::prelude::{
    Artifact, AuthToken, Directory, DirectoryError, GroupId, Owner, PathError, StorePath, UserId,
};

use super::Database;

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("invalid directory: {0}")]
    Directory(#[from] DirectoryError),
    #[error("invalid artifact path: {0}")]
    Path(#[from] PathError),
    #[error("no directory recorded at {0}")]
    UnknownDirectory(String),
}

/// A `directories` row as stored, before any validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryRow {
    pub id: i64,
    pub path: String,
    pub user_id: Option<i64>,
    pub group_id: Option<i64>,
    pub is_public: bool,
}

impl DirectoryRow {
    /// Check the row against the directory invariants.
    pub fn validate(&self) -> Result<Directory, DirectoryError> {
        Directory::from_parts(
            &self.path,
            self.user_id.map(UserId),
            self.group_id.map(GroupId),
            self.is_public,
        )
    }

    /// The directory this row describes, as far as it can be served.
    ///
    /// Anonymous private rows predate validation and are kept as they are;
    /// rows with an unusable path are dropped.
    pub fn to_directory(&self) -> Option<Directory> {
        match self.validate() {
            Ok(directory) => Some(directory),
            Err(DirectoryError::AnonymousNotPublic) => {
                tracing::warn!(path = %self.path, "anonymous directory is not public");
                let path = StorePath::parse(&self.path).ok()?;
                Some(Directory::unchecked(path, Owner::Anonymous, false))
            }
            Err(e) => {
                tracing::warn!(id = self.id, path = %self.path, "skipping directory row: {}", e);
                None
            }
        }
    }
}

impl Database {
    pub async fn create_user(
        &self,
        username: &str,
        is_active: bool,
    ) -> Result<UserId, RecordError> {
        let id = sqlx::query("INSERT INTO users (username, is_active) VALUES (?, ?)")
            .bind(username)
            .bind(is_active)
            .execute(&**self)
            .await?
            .last_insert_rowid();
        Ok(UserId(id))
    }

    pub async fn set_user_active(&self, user: UserId, is_active: bool) -> Result<(), RecordError> {
        sqlx::query("UPDATE users SET is_active = ? WHERE id = ?")
            .bind(is_active)
            .bind(user.0)
            .execute(&**self)
            .await?;
        Ok(())
    }

    pub async fn create_group(&self, name: &str) -> Result<GroupId, RecordError> {
        let id = sqlx::query("INSERT INTO groups (name) VALUES (?)")
            .bind(name)
            .execute(&**self)
            .await?
            .last_insert_rowid();
        Ok(GroupId(id))
    }

    pub async fn add_member(&self, user: UserId, group: GroupId) -> Result<(), RecordError> {
        sqlx::query("INSERT OR IGNORE INTO user_groups (user_id, group_id) VALUES (?, ?)")
            .bind(user.0)
            .bind(group.0)
            .execute(&**self)
            .await?;
        Ok(())
    }

    /// Issue a new token for `user`.
    pub async fn create_token(
        &self,
        user: UserId,
        description: &str,
    ) -> Result<AuthToken, RecordError> {
        let token = AuthToken::generate(user, description);
        sqlx::query("INSERT INTO auth_tokens (user_id, secret, description) VALUES (?, ?, ?)")
            .bind(token.user_id.0)
            .bind(&token.secret)
            .bind(&token.description)
            .execute(&**self)
            .await?;
        Ok(token)
    }

    pub async fn create_directory(&self, directory: &Directory) -> Result<i64, RecordError> {
        let (user, group) = directory.owner_columns();
        let id = sqlx::query(
            "INSERT INTO directories (path, user_id, group_id, is_public) VALUES (?, ?, ?, ?)",
        )
        .bind(directory.path().as_str())
        .bind(user.map(|u| u.0))
        .bind(group.map(|g| g.0))
        .bind(directory.is_public())
        .execute(&**self)
        .await?
        .last_insert_rowid();
        Ok(id)
    }

    /// Record a file stored into the directory at `directory_path`.
    ///
    /// The key is derived once from the directory, the creation time and
    /// `filename`; see [`Artifact::storage_key`].
    pub async fn create_artifact(
        &self,
        directory_path: &str,
        filename: &str,
        is_permanent: bool,
        size: u64,
        created_at: DateTime<Utc>,
    ) -> Result<Artifact, RecordError> {
        let row = self
            .directory_row(directory_path)
            .await?
            .ok_or_else(|| RecordError::UnknownDirectory(directory_path.to_string()))?;
        let directory = row
            .to_directory()
            .ok_or_else(|| RecordError::UnknownDirectory(directory_path.to_string()))?;

        let key = Artifact::storage_key(&directory, filename, is_permanent, &created_at)?;
        let artifact = Artifact::new(&key, is_permanent, size)?;

        sqlx::query(
            r#"
            INSERT INTO artifacts (key, directory_id, is_permanent, size, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(artifact.key())
        .bind(row.id)
        .bind(is_permanent)
        .bind(size as i64)
        .bind(created_at.to_rfc3339())
        .execute(&**self)
        .await?;
        Ok(artifact)
    }

    async fn directory_row(&self, path: &str) -> Result<Option<DirectoryRow>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT id, path, user_id, group_id, is_public FROM directories WHERE path = ?",
        )
        .bind(path)
        .fetch_optional(&**self)
        .await?;
        row.map(|r| directory_row(&r)).transpose()
    }

    /// Every directory row, valid or not, in path order.
    pub async fn directory_rows(&self) -> Result<Vec<DirectoryRow>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT id, path, user_id, group_id, is_public FROM directories ORDER BY path",
        )
        .fetch_all(&**self)
        .await?;
        rows.iter().map(directory_row).collect()
    }
}

fn directory_row(row: &sqlx::sqlite::SqliteRow) -> Result<DirectoryRow, sqlx::Error> {
    Ok(DirectoryRow {
        id: row.try_get("id")?,
        path: row.try_get("path")?,
        user_id: row.try_get("user_id")?,
        group_id: row.try_get("group_id")?,
        is_public: row.try_get("is_public")?,
    })
}
