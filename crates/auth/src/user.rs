//! Stored user accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use userguard_core::UserId;

use crate::{Identity, Role};

/// A stored user.
///
/// Emails are unique (case-insensitive, stored lower-cased). The password
/// hash never leaves the process: it is skipped when serialising.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// The authorization-relevant view of this user.
    pub fn identity(&self) -> Identity {
        Identity::new(self.id, self.role)
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// Public subset returned alongside a fresh access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
}
