use std::fmt;

use serde::{Deserialize, Serialize};

use super::{GroupId, UserId};
use crate::path::{self, StorePath};

/// Who owns a directory. Exactly one of the three holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Owner {
    User(UserId),
    Group(GroupId),
    /// Nobody owns it; such a directory must be public.
    Anonymous,
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Owner::User(id) => write!(f, "{}", id),
            Owner::Group(id) => write!(f, "{}", id),
            Owner::Anonymous => write!(f, "anonymous"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectoryError {
    #[error("cannot be owned by user and group")]
    BothOwners,
    #[error("an anonymous directory should be public")]
    AnonymousNotPublic,
    #[error("expecting an absolute path: {0:?}")]
    NotAbsolute(String),
    #[error("expecting a normalized path: {0:?}")]
    NotNormalized(String),
}

/// An explicit directory record.
///
/// Directories form a tree only through their paths: the parent of a
/// directory is whichever record has the longest path that is a prefix of
/// its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directory {
    path: StorePath,
    owner: Owner,
    is_public: bool,
}

impl Directory {
    pub fn new(path: &str, owner: Owner, is_public: bool) -> Result<Self, DirectoryError> {
        if !path.starts_with('/') {
            return Err(DirectoryError::NotAbsolute(path.to_string()));
        }
        if !path::is_normalized(path) {
            return Err(DirectoryError::NotNormalized(path.to_string()));
        }
        if owner == Owner::Anonymous && !is_public {
            return Err(DirectoryError::AnonymousNotPublic);
        }

        let path =
            StorePath::parse(path).map_err(|_| DirectoryError::NotNormalized(path.to_string()))?;
        Ok(Self {
            path,
            owner,
            is_public,
        })
    }

    /// Build a directory from the nullable columns of the account store.
    pub fn from_parts(
        path: &str,
        user: Option<UserId>,
        group: Option<GroupId>,
        is_public: bool,
    ) -> Result<Self, DirectoryError> {
        let owner = match (user, group) {
            (Some(_), Some(_)) => return Err(DirectoryError::BothOwners),
            (Some(user), None) => Owner::User(user),
            (None, Some(group)) => Owner::Group(group),
            (None, None) => Owner::Anonymous,
        };
        Self::new(path, owner, is_public)
    }

    /// Build a directory record without checking the ownership invariant.
    ///
    /// Stores written before validation existed may hold anonymous private
    /// directories; visibility still has to give them a defined meaning.
    pub fn unchecked(path: StorePath, owner: Owner, is_public: bool) -> Self {
        Self {
            path,
            owner,
            is_public,
        }
    }

    pub fn path(&self) -> &StorePath {
        &self.path
    }

    pub fn owner(&self) -> Owner {
        self.owner
    }

    pub fn is_public(&self) -> bool {
        self.is_public
    }

    pub fn is_anonymous(&self) -> bool {
        self.owner == Owner::Anonymous
    }

    /// The nullable (user, group) columns for this owner.
    pub fn owner_columns(&self) -> (Option<UserId>, Option<GroupId>) {
        match self.owner {
            Owner::User(user) => (Some(user), None),
            Owner::Group(group) => (None, Some(group)),
            Owner::Anonymous => (None, None),
        }
    }
}

impl fmt::Display for Directory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.path, self.owner)
    }
}
