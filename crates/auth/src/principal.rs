use serde::{Deserialize, Serialize};

use userguard_core::UserId;

use crate::Role;

/// The authenticated caller of a request.
///
/// Resolved per request from the stored user that the validated token's
/// subject refers to. Rules are built from these two fields only.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub role: Role,
}

impl Identity {
    pub fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }
}
