use std::fmt;

use serde::{Deserialize, Serialize};

use super::UserId;

/// A bearer token bound to a user.
///
/// A user may hold any number of tokens, one per device or script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    pub user_id: UserId,
    pub secret: String,
    pub description: String,
}

impl AuthToken {
    /// Issue a token with a fresh random secret.
    pub fn generate(user_id: UserId, description: impl Into<String>) -> Self {
        Self {
            user_id,
            secret: Self::generate_secret(),
            description: description.into(),
        }
    }

    /// 32 lowercase hex characters drawn from 16 random bytes.
    pub fn generate_secret() -> String {
        let bytes: [u8; 16] = rand::random();
        hex::encode(bytes)
    }
}

impl fmt::Display for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.user_id, self.description)
    }
}
