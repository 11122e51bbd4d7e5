//! # Principals
//!
//! A [`Principal`] is the identity every visibility decision is made for.
//! It is either [`Principal::Anonymous`] or an *active* user together with
//! the groups that user belongs to.
//!
//! ## Inactive users
//!
//! The account store reports users as an [`Account`], which carries an
//! `is_active` flag. Converting an inactive account yields
//! [`Principal::Anonymous`], so a deactivated user can never see more than a
//! client without any token.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{GroupId, UserId};

/// A user record as stored by the account store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub user_id: UserId,
    pub is_active: bool,
    /// Every group the user is a member of.
    pub groups: BTreeSet<GroupId>,
}

impl Account {
    pub fn new(
        user_id: UserId,
        is_active: bool,
        groups: impl IntoIterator<Item = GroupId>,
    ) -> Self {
        Self {
            user_id,
            is_active,
            groups: groups.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Principal {
    /// No token, an unknown token, or a token bound to an inactive user.
    #[default]
    Anonymous,
    /// An active user.
    User {
        id: UserId,
        groups: BTreeSet<GroupId>,
    },
}

impl Principal {
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Principal::Anonymous)
    }

    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Principal::Anonymous => None,
            Principal::User { id, .. } => Some(*id),
        }
    }

    pub fn is_user(&self, user: UserId) -> bool {
        self.user_id() == Some(user)
    }

    pub fn in_group(&self, group: GroupId) -> bool {
        match self {
            Principal::Anonymous => false,
            Principal::User { groups, .. } => groups.contains(&group),
        }
    }
}

impl From<Account> for Principal {
    fn from(account: Account) -> Self {
        if !account.is_active {
            return Principal::Anonymous;
        }
        Principal::User {
            id: account.user_id,
            groups: account.groups,
        }
    }
}

impl From<Option<Account>> for Principal {
    fn from(account: Option<Account>) -> Self {
        account.map(Principal::from).unwrap_or_default()
    }
}
