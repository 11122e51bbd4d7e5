mod index;
mod memory;
mod provider;

use std::sync::Arc;

use parking_lot::RwLock;

pub use index::DirectoryIndex;
pub use memory::{MemoryCatalogProvider, MemoryCatalogProviderError};
pub use provider::{CatalogError, CatalogProvider};

/// The view of the store every request is resolved against.
///
/// Wraps a [`CatalogProvider`] and keeps a [`DirectoryIndex`] built from its
/// directory records. Requests take a snapshot of the index (an `Arc` clone)
/// and never hold the lock while they work; [`Catalog::refresh`] swaps in a
/// new snapshot when the administrator changes directories.
#[derive(Debug, Clone)]
pub struct Catalog<P: CatalogProvider> {
    provider: P,
    index: Arc<RwLock<Arc<DirectoryIndex>>>,
}

impl<P: CatalogProvider> Catalog<P> {
    /// Build a catalog and its first index snapshot.
    pub async fn load(provider: P) -> Result<Self, CatalogError<P::Error>> {
        let catalog = Self {
            provider,
            index: Arc::new(RwLock::new(Arc::new(DirectoryIndex::default()))),
        };
        catalog.refresh().await?;
        Ok(catalog)
    }

    /// Rebuild the directory index from the provider.
    ///
    /// Returns the number of directories indexed.
    pub async fn refresh(&self) -> Result<usize, CatalogError<P::Error>> {
        let directories = self.provider.directories().await?;
        let index = Arc::new(DirectoryIndex::new(directories));
        let count = index.len();
        *self.index.write() = index;
        tracing::debug!(directories = count, "catalog index refreshed");
        Ok(count)
    }

    /// The current index snapshot.
    pub fn index(&self) -> Arc<DirectoryIndex> {
        self.index.read().clone()
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Directory, Owner};

    #[tokio::test]
    async fn test_refresh_picks_up_new_directories() {
        let provider = MemoryCatalogProvider::new();
        provider
            .insert_directory(Directory::new("/pub", Owner::Anonymous, true).unwrap())
            .unwrap();

        let catalog = Catalog::load(provider.clone()).await.unwrap();
        let before = catalog.index();
        assert_eq!(before.len(), 1);

        provider
            .insert_directory(Directory::new("/pub/debian", Owner::Anonymous, true).unwrap())
            .unwrap();
        assert_eq!(catalog.refresh().await.unwrap(), 2);

        // snapshots taken earlier are unaffected
        assert_eq!(before.len(), 1);
        assert_eq!(catalog.index().len(), 2);
    }
}
