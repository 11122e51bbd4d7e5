use std::collections::BTreeSet;

use super::visibility::{governed, reachable, Governed};
use super::{Listing, ResolveError};
use crate::catalog::{Catalog, CatalogError, CatalogProvider, DirectoryIndex};
use crate::model::{Artifact, Principal};
use crate::path::{self, StorePath};

impl<P: CatalogProvider> Catalog<P> {
    /// List what `principal` can see directly below `path`.
    pub async fn list(
        &self,
        path: &StorePath,
        principal: &Principal,
    ) -> Result<Listing, ResolveError<P::Error>> {
        let index = self.index();

        // refuse before touching the artifact table
        if !path.is_root() {
            if let Governed::Hidden(directory) = governed(&index, path.as_str(), principal) {
                tracing::debug!(%path, governed_by = %directory, "listing refused");
                return Err(ResolveError::Forbidden);
            }
        }

        let artifacts = self.provider().artifacts_under(path).await?;
        build_listing(&index, path, &artifacts, principal)
    }

    /// Find the artifact stored at `path` if `principal` may read it.
    pub async fn locate(
        &self,
        path: &StorePath,
        principal: &Principal,
    ) -> Result<Artifact, ResolveError<P::Error>> {
        let artifact = self
            .provider()
            .artifact(path.key())
            .await?
            .ok_or(ResolveError::NotFound)?;

        check_artifact(&self.index(), &artifact, principal)?;
        Ok(artifact)
    }

    /// Total size of every artifact below `path`, ignoring visibility.
    pub async fn usage(&self, path: &StorePath) -> Result<u64, CatalogError<P::Error>> {
        let artifacts = self.provider().artifacts_under(path).await?;
        Ok(artifacts.iter().map(Artifact::size).sum())
    }
}

/// Whether `principal` may read `artifact`, judged by its governing directory.
pub(crate) fn check_artifact<E>(
    index: &DirectoryIndex,
    artifact: &Artifact,
    principal: &Principal,
) -> Result<(), ResolveError<E>> {
    match governed(index, artifact.path().as_str(), principal) {
        Governed::Visible(_) => Ok(()),
        Governed::Hidden(directory) => {
            tracing::debug!(%artifact, governed_by = %directory, "download refused");
            Err(ResolveError::Forbidden)
        }
        Governed::Ungoverned => {
            tracing::warn!(%artifact, "artifact has no governing directory");
            Err(ResolveError::NotFound)
        }
    }
}

/// Build the listing of `path` from the artifacts stored below it.
///
/// Child directories come from explicit directory records and from the
/// intermediate segments of artifact keys (date shards, nested folders).
/// Anything behind a directory the principal cannot see is left out.
pub(crate) fn build_listing<E>(
    index: &DirectoryIndex,
    path: &StorePath,
    artifacts: &[Artifact],
    principal: &Principal,
) -> Result<Listing, ResolveError<E>> {
    let from = path.as_str();
    let mut directories = BTreeSet::new();
    let mut files = Vec::new();
    let mut size = 0;

    for directory in index.descendants(path) {
        let target = directory.path().as_str();
        if !reachable(index, from, target, principal) {
            continue;
        }
        if let Some(name) = path::child_segment(from, target) {
            directories.insert(name.to_string());
        }
    }

    for artifact in artifacts {
        let target = artifact.path().as_str();
        let visible = matches!(governed(index, target, principal), Governed::Visible(_))
            && reachable(index, from, target, principal);
        if !visible {
            continue;
        }

        size += artifact.size();
        if artifact.path().parent().as_ref() == Some(path) {
            files.push((artifact.file_name().to_string(), artifact.size()));
        } else if let Some(name) = path::child_segment(from, target) {
            directories.insert(name.to_string());
        }
    }

    // a hidden prefix nobody governs must look exactly like a missing one
    if !path.is_root() && index.get(from).is_none() {
        let exists = if index.governing(from).is_some() {
            !artifacts.is_empty() || index.descendants(path).next().is_some()
        } else {
            !directories.is_empty() || !files.is_empty()
        };
        if !exists {
            return Err(ResolveError::NotFound);
        }
    }

    files.sort();
    Ok(Listing {
        directory: from.to_string(),
        directories: directories.into_iter().collect(),
        files,
        size,
    })
}
