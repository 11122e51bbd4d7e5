//! Canonical store paths.
//!
//! Every path the core works with is a [`StorePath`]: absolute, starting with
//! `/`, without `.`/`..`/empty segments and without a trailing slash (the root
//! `/` excepted). Artifact keys are the same paths without the leading slash.
//!
//! Prefix relationships are always segment-aligned: `/pub` is an ancestor of
//! `/pub/debian` but not of `/pub2`.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const ROOT: &str = "/";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// The path climbs above the store root
    #[error("path escapes the store root")]
    EscapesRoot,
    /// The path contains a segment we never serve
    #[error("invalid path segment: {0:?}")]
    InvalidSegment(String),
}

/// A normalized absolute path inside the store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StorePath(String);

impl StorePath {
    pub fn root() -> Self {
        Self(ROOT.to_string())
    }

    /// Normalize `raw`, collapsing `.`, `..` and repeated separators.
    ///
    /// Leading slashes are optional; a trailing slash is dropped. Fails if a
    /// `..` would climb above the root or a segment carries a NUL byte or a
    /// backslash.
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        let mut segments: Vec<&str> = Vec::new();
        for segment in raw.split('/') {
            match segment {
                "" | "." => continue,
                ".." => {
                    if segments.pop().is_none() {
                        return Err(PathError::EscapesRoot);
                    }
                }
                s if s.contains('\0') || s.contains('\\') => {
                    return Err(PathError::InvalidSegment(s.to_string()));
                }
                s => segments.push(s),
            }
        }

        Ok(Self(format!("/{}", segments.join("/"))))
    }

    /// Build a path from a relative artifact key.
    pub fn from_key(key: &str) -> Result<Self, PathError> {
        Self::parse(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == ROOT
    }

    /// The relative blob key for this path (no leading slash, empty for the root).
    pub fn key(&self) -> &str {
        &self.0[1..]
    }

    /// The last segment, `None` for the root.
    pub fn file_name(&self) -> Option<&str> {
        if self.is_root() {
            return None;
        }
        self.0.rsplit('/').next()
    }

    pub fn parent(&self) -> Option<StorePath> {
        parent_of(&self.0).map(|p| Self(p.to_string()))
    }

    /// This path followed by each of its ancestors, ending with the root.
    pub fn ancestors(&self) -> impl Iterator<Item = &str> {
        ancestors(&self.0)
    }

    pub fn join(&self, segment: &str) -> Result<Self, PathError> {
        Self::parse(&format!("{}/{}", self.0, segment))
    }

    /// Whether `other` is this path or lies below it.
    pub fn contains(&self, other: &str) -> bool {
        is_within(&self.0, other)
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StorePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for StorePath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<StorePath> for String {
    fn from(path: StorePath) -> Self {
        path.0
    }
}

/// What a request asks for once its path is normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestTarget {
    /// List the children of a directory
    Listing(StorePath),
    /// Fetch the bytes of one artifact
    File(StorePath),
}

impl RequestTarget {
    /// Classify a raw request path (the part after the store prefix).
    ///
    /// An empty path, a trailing slash, or a path that collapses to the root
    /// asks for a listing; anything else asks for a file.
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        let path = StorePath::parse(raw)?;
        if raw.is_empty() || raw.ends_with('/') || path.is_root() {
            Ok(Self::Listing(path))
        } else {
            Ok(Self::File(path))
        }
    }

    pub fn path(&self) -> &StorePath {
        match self {
            Self::Listing(path) | Self::File(path) => path,
        }
    }
}

/// True when `raw` is already in canonical absolute form.
pub fn is_normalized(raw: &str) -> bool {
    match StorePath::parse(raw) {
        Ok(path) => path.as_str() == raw,
        Err(_) => false,
    }
}

pub(crate) fn ancestors(path: &str) -> impl Iterator<Item = &str> {
    std::iter::successors(Some(path), |p| parent_of(p))
}

pub(crate) fn parent_of(path: &str) -> Option<&str> {
    if path == ROOT {
        return None;
    }
    match path.rfind('/') {
        Some(0) => Some(ROOT),
        Some(idx) => Some(&path[..idx]),
        None => None,
    }
}

/// Segment-aligned containment: `path` equals `ancestor` or lies below it.
pub(crate) fn is_within(ancestor: &str, path: &str) -> bool {
    if ancestor == ROOT {
        return path.starts_with('/');
    }
    match path.strip_prefix(ancestor) {
        Some("") => true,
        Some(rest) => rest.starts_with('/'),
        None => false,
    }
}

/// The first segment of `path` below `parent`, if `path` lies strictly below it.
pub(crate) fn child_segment<'a>(parent: &str, path: &'a str) -> Option<&'a str> {
    if !is_within(parent, path) || parent == path {
        return None;
    }
    let rest = if parent == ROOT {
        &path[1..]
    } else {
        &path[parent.len() + 1..]
    };
    rest.split('/').next().filter(|s| !s.is_empty())
}
