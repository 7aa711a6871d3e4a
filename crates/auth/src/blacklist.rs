//! Process-wide token revocation list.

use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use crate::token::TokenVerifier;

/// Revoked bearer tokens.
///
/// Constructed once at process start and shared (via `Arc`) between the
/// logout path and the authentication path. Entries live for the lifetime of
/// the process; the tokens' own expiry eventually makes them irrelevant.
pub struct TokenBlacklist {
    verifier: Arc<dyn TokenVerifier>,
    tokens: RwLock<HashSet<String>>,
}

impl TokenBlacklist {
    pub fn new(verifier: Arc<dyn TokenVerifier>) -> Self {
        Self {
            verifier,
            tokens: RwLock::new(HashSet::new()),
        }
    }

    /// Revoke `token`. Tokens that do not verify are skipped: there is
    /// nothing to revoke.
    pub fn add(&self, token: &str) {
        self.add_at(token, Utc::now())
    }

    pub fn add_at(&self, token: &str, now: DateTime<Utc>) {
        if token.is_empty() {
            return;
        }

        if let Err(e) = self.verifier.verify(token, now) {
            tracing::warn!(error = %e, "invalid or expired token, not added to blacklist");
            return;
        }

        self.write().insert(token.to_string());
    }

    pub fn is_blacklisted(&self, token: &str) -> bool {
        self.read().contains(token)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    // A poisoned lock still holds every revoked token.
    fn read(&self) -> RwLockReadGuard<'_, HashSet<String>> {
        self.tokens.read().unwrap_or_else(|poisoned| {
            tracing::error!("token blacklist lock poisoned; recovering");
            PoisonError::into_inner(poisoned)
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashSet<String>> {
        self.tokens.write().unwrap_or_else(|poisoned| {
            tracing::error!("token blacklist lock poisoned; recovering");
            PoisonError::into_inner(poisoned)
        })
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl core::fmt::Debug for TokenBlacklist {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenBlacklist")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}
