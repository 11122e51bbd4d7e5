use std::fmt::{Debug, Display};

use async_trait::async_trait;

use crate::model::{Account, Artifact, Directory};
use crate::path::StorePath;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError<T> {
    /// The backing store failed to answer
    #[error("unhandled catalog provider error: {0}")]
    Provider(#[from] T),
}

/// Read-only access to the records an administrator manages elsewhere.
///
/// The core never writes through this trait. Implementations must be cheap to
/// clone and safe to query from many requests at once.
#[async_trait]
pub trait CatalogProvider: Send + Sync + Debug + Clone + 'static {
    type Error: Display + Debug + Send + Sync + 'static;

    /// Look up the account a token secret belongs to
    ///
    /// # Returns
    /// * `Ok(Some(Account))` - The token exists; the account may be inactive
    /// * `Ok(None)` - No token carries this secret
    async fn account_for_token(
        &self,
        secret: &str,
    ) -> Result<Option<Account>, CatalogError<Self::Error>>;

    /// Every directory record
    async fn directories(&self) -> Result<Vec<Directory>, CatalogError<Self::Error>>;

    /// The artifact stored under exactly this key, if any
    async fn artifact(&self, key: &str) -> Result<Option<Artifact>, CatalogError<Self::Error>>;

    /// Every artifact whose path lies strictly below `path`
    async fn artifacts_under(
        &self,
        path: &StorePath,
    ) -> Result<Vec<Artifact>, CatalogError<Self::Error>>;
}
