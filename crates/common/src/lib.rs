/**
 * Records the store is built from: principals,
 *  directories with their owners, artifacts
 *  and the tokens that identify users.
 */
pub mod model;
/**
 * Request path normalization. Turns whatever
 *  the client sent into a canonical absolute
 *  path, or refuses it.
 */
pub mod path;
/**
 * Read-only view over the externally managed
 *  directory, artifact and token records,
 *  plus the prefix index used per request.
 */
pub mod catalog;
/**
 * Identity resolution, visibility decisions
 *  and directory listings.
 */
pub mod access;
/**
 * Byte storage behind the artifacts: locating
 *  blobs on disk, media types and checksums.
 */
pub mod blobs;

pub mod prelude {
    pub use crate::access::{Listing, ResolveError};
    pub use crate::blobs::{Blob, BlobError, BlobStore};
    pub use crate::catalog::{
        Catalog, CatalogError, CatalogProvider, DirectoryIndex, MemoryCatalogProvider,
    };
    pub use crate::model::{
        Account, Artifact, AuthToken, Directory, DirectoryError, GroupId, Owner, Principal,
        UserId,
    };
    pub use crate::path::{PathError, RequestTarget, StorePath};
}
