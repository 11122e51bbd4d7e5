use std::fmt;

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

use super::Directory;
use crate::path::{PathError, StorePath};

/// Layout of the date segment inserted in front of non-permanent artifacts.
const DATE_SHARD_FORMAT: &str = "%Y/%m/%d/%H/%M";

/// A stored file.
///
/// Artifacts carry no ownership of their own: whoever owns the deepest
/// directory above the key owns the artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    path: StorePath,
    is_permanent: bool,
    size: u64,
}

impl Artifact {
    /// Wrap an existing storage key (with or without a leading slash).
    pub fn new(key: &str, is_permanent: bool, size: u64) -> Result<Self, PathError> {
        let path = StorePath::from_key(key)?;
        if path.is_root() {
            return Err(PathError::InvalidSegment(key.to_string()));
        }
        Ok(Self {
            path,
            is_permanent,
            size,
        })
    }

    /// Compute the storage key for a file stored into `directory`.
    ///
    /// Non-permanent artifacts are sharded under the creation date, e.g.
    /// `pub/debian/2015/01/12/08/30/debian-7.iso`. The key is fixed at
    /// creation and never recomputed. Fails if `filename` climbs out of the
    /// directory.
    pub fn storage_key<Tz>(
        directory: &Directory,
        filename: &str,
        is_permanent: bool,
        created_at: &DateTime<Tz>,
    ) -> Result<String, PathError>
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let shard = if is_permanent {
            String::new()
        } else {
            created_at.format(DATE_SHARD_FORMAT).to_string()
        };

        let path = StorePath::parse(&format!("{}/{}/{}", directory.path(), shard, filename))?;
        if path == *directory.path() || !directory.path().contains(path.as_str()) {
            return Err(PathError::EscapesRoot);
        }
        Ok(path.key().to_string())
    }

    /// The relative key into the blob store.
    pub fn key(&self) -> &str {
        self.path.key()
    }

    /// The key as an absolute store path.
    pub fn path(&self) -> &StorePath {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        self.path.file_name().unwrap_or_default()
    }

    pub fn is_permanent(&self) -> bool {
        self.is_permanent
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
