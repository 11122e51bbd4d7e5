//! # Access
//!
//! Everything that decides what a request may see:
//!
//! - **identity**: token secret → [`Principal`](crate::model::Principal)
//! - **visibility**: directory + principal → visible or not
//! - **tree**: directory listings and artifact lookups filtered by visibility
//!
//! A path is answered with [`ResolveError::NotFound`] when no record covers it
//! at all and with [`ResolveError::Forbidden`] when a record covers it but is
//! not visible to the principal.

mod identity;
mod tree;
pub mod visibility;

use serde::Serialize;

use crate::catalog::CatalogError;

pub use visibility::is_visible;

#[derive(Debug, thiserror::Error)]
pub enum ResolveError<E> {
    #[error("no record matches the path")]
    NotFound,
    #[error("the path is not visible to this principal")]
    Forbidden,
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError<E>),
}

/// The visible children of one directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Listing {
    /// The canonical path that was listed
    pub directory: String,
    /// Names of child directories, sorted
    pub directories: Vec<String>,
    /// `(name, size in bytes)` of child files, sorted by name
    pub files: Vec<(String, u64)>,
    /// Total size of every visible artifact below the directory
    pub size: u64,
}
