use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::provider::{CatalogError, CatalogProvider};
use crate::model::{Account, Artifact, AuthToken, Directory, UserId};
use crate::path::{self, StorePath};

/// In-memory catalog provider using HashMaps
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalogProvider {
    inner: Arc<RwLock<MemoryCatalogProviderInner>>,
}

#[derive(Debug, Default)]
struct MemoryCatalogProviderInner {
    /// token secret -> owning user
    tokens: HashMap<String, UserId>,
    accounts: HashMap<UserId, Account>,
    directories: BTreeMap<String, Directory>,
    /// artifact key -> artifact
    artifacts: BTreeMap<String, Artifact>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryCatalogProviderError {
    #[error("memory provider error: {0}")]
    Internal(String),
    #[error("duplicate token secret")]
    DuplicateSecret,
}

impl MemoryCatalogProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(
        &self,
    ) -> Result<RwLockReadGuard<'_, MemoryCatalogProviderInner>, MemoryCatalogProviderError> {
        self.inner.read().map_err(|e| {
            MemoryCatalogProviderError::Internal(format!("failed to acquire read lock: {}", e))
        })
    }

    fn write(
        &self,
    ) -> Result<RwLockWriteGuard<'_, MemoryCatalogProviderInner>, MemoryCatalogProviderError> {
        self.inner.write().map_err(|e| {
            MemoryCatalogProviderError::Internal(format!("failed to acquire write lock: {}", e))
        })
    }

    pub fn insert_account(&self, account: Account) -> Result<(), MemoryCatalogProviderError> {
        self.write()?.accounts.insert(account.user_id, account);
        Ok(())
    }

    /// Register a token. Secrets are unique across all tokens.
    pub fn insert_token(&self, token: &AuthToken) -> Result<(), MemoryCatalogProviderError> {
        let mut inner = self.write()?;
        if inner.tokens.contains_key(&token.secret) {
            return Err(MemoryCatalogProviderError::DuplicateSecret);
        }
        inner.tokens.insert(token.secret.clone(), token.user_id);
        Ok(())
    }

    pub fn insert_directory(&self, directory: Directory) -> Result<(), MemoryCatalogProviderError> {
        let key = directory.path().as_str().to_string();
        self.write()?.directories.insert(key, directory);
        Ok(())
    }

    pub fn insert_artifact(&self, artifact: Artifact) -> Result<(), MemoryCatalogProviderError> {
        let key = artifact.key().to_string();
        self.write()?.artifacts.insert(key, artifact);
        Ok(())
    }
}

#[async_trait]
impl CatalogProvider for MemoryCatalogProvider {
    type Error = MemoryCatalogProviderError;

    async fn account_for_token(
        &self,
        secret: &str,
    ) -> Result<Option<Account>, CatalogError<Self::Error>> {
        let inner = self.read()?;
        Ok(inner
            .tokens
            .get(secret)
            .and_then(|user_id| inner.accounts.get(user_id))
            .cloned())
    }

    async fn directories(&self) -> Result<Vec<Directory>, CatalogError<Self::Error>> {
        let inner = self.read()?;
        Ok(inner.directories.values().cloned().collect())
    }

    async fn artifact(&self, key: &str) -> Result<Option<Artifact>, CatalogError<Self::Error>> {
        let inner = self.read()?;
        Ok(inner.artifacts.get(key).cloned())
    }

    async fn artifacts_under(
        &self,
        path: &StorePath,
    ) -> Result<Vec<Artifact>, CatalogError<Self::Error>> {
        let inner = self.read()?;
        let prefix = path.key().to_string();
        Ok(inner
            .artifacts
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .map(|(_, artifact)| artifact)
            .filter(|artifact| {
                artifact.path() != path && path::is_within(path.as_str(), artifact.path().as_str())
            })
            .cloned()
            .collect())
    }
}
