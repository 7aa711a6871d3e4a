//! Login, logout and bearer-token authentication.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use userguard_auth::{verify_password, TokenBlacklist, TokenError, TokenIssuer, TokenVerifier, User, UserSummary};

use crate::users::UserRepository;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token has been revoked")]
    Revoked,

    #[error("Invalid token: {0}")]
    InvalidToken(TokenError),

    #[error("User not found")]
    UnknownUser,

    #[error("failed to issue token: {0}")]
    Issue(TokenError),
}

/// Result of a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResult {
    pub access_token: String,
    pub user: UserSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutOutcome {
    NoActiveSession,
    LoggedOut,
}

impl LogoutOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            LogoutOutcome::NoActiveSession => "No active session",
            LogoutOutcome::LoggedOut => "Successfully logged out",
        }
    }
}

/// Token lifecycle for users stored in `R`.
///
/// The blacklist is shared with whoever else needs to consult it; this
/// service is its only writer.
pub struct SessionService<R> {
    users: R,
    issuer: Arc<dyn TokenIssuer>,
    verifier: Arc<dyn TokenVerifier>,
    blacklist: Arc<TokenBlacklist>,
}

impl<R: UserRepository> SessionService<R> {
    pub fn new(
        users: R,
        issuer: Arc<dyn TokenIssuer>,
        verifier: Arc<dyn TokenVerifier>,
        blacklist: Arc<TokenBlacklist>,
    ) -> Self {
        Self {
            users,
            issuer,
            verifier,
            blacklist,
        }
    }

    pub fn blacklist(&self) -> &Arc<TokenBlacklist> {
        &self.blacklist
    }

    pub fn login(&self, email: &str, password: &str, now: DateTime<Utc>) -> Result<LoginResult, SessionError> {
        let email = email.trim().to_lowercase();
        let user = self
            .users
            .find_by_email(&email)
            .filter(|u| verify_password(&u.password_hash, password))
            .ok_or_else(|| {
                tracing::info!("login rejected");
                SessionError::InvalidCredentials
            })?;

        let access_token = self
            .issuer
            .issue(user.id, &user.email, now)
            .map_err(SessionError::Issue)?;

        tracing::info!(user_id = %user.id, "user logged in");
        Ok(LoginResult {
            access_token,
            user: user.summary(),
        })
    }

    /// Revoke the presented token, if any.
    pub fn logout(&self, token: Option<&str>) -> LogoutOutcome {
        match token.filter(|t| !t.is_empty()) {
            None => LogoutOutcome::NoActiveSession,
            Some(token) => {
                self.blacklist.add(token);
                tracing::info!("session revoked");
                LogoutOutcome::LoggedOut
            }
        }
    }

    /// Resolve a bearer token to the stored user it was issued for.
    pub fn authenticate(&self, token: &str, now: DateTime<Utc>) -> Result<User, SessionError> {
        if self.blacklist.is_blacklisted(token) {
            return Err(SessionError::Revoked);
        }

        let claims = self.verifier.verify(token, now).map_err(|e| {
            tracing::warn!(error = %e, "rejected bearer token");
            SessionError::InvalidToken(e)
        })?;

        self.users.find_by_id(claims.sub).ok_or(SessionError::UnknownUser)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use userguard_auth::{Hs256TokenCodec, Role};

    use super::*;
    use crate::users::{InMemoryUserRepository, NewUser, UserService};

    struct Fixture {
        users: UserService<Arc<InMemoryUserRepository>>,
        sessions: SessionService<Arc<InMemoryUserRepository>>,
    }

    fn fixture() -> Fixture {
        let repo = Arc::new(InMemoryUserRepository::new());
        let codec = Arc::new(Hs256TokenCodec::new(b"session-test", Duration::hours(1)));
        let blacklist = Arc::new(TokenBlacklist::new(codec.clone()));
        Fixture {
            users: UserService::new(repo.clone()),
            sessions: SessionService::new(repo, codec.clone(), codec, blacklist),
        }
    }

    fn register(f: &Fixture) -> User {
        f.users
            .create(NewUser {
                name: "Alice".into(),
                email: "alice@example.com".into(),
                password: "password123".into(),
                role: Some(Role::Manager),
            })
            .unwrap()
    }

    #[test]
    fn login_issues_a_token_that_authenticates() {
        let f = fixture();
        let alice = register(&f);
        let now = Utc::now();

        let result = f.sessions.login("Alice@Example.com", "password123", now).unwrap();
        assert_eq!(result.user, alice.summary());

        let user = f.sessions.authenticate(&result.access_token, now).unwrap();
        assert_eq!(user.id, alice.id);
    }

    #[test]
    fn wrong_password_and_unknown_email_look_the_same() {
        let f = fixture();
        register(&f);
        let now = Utc::now();

        assert_eq!(
            f.sessions.login("alice@example.com", "nope", now),
            Err(SessionError::InvalidCredentials)
        );
        assert_eq!(
            f.sessions.login("bob@example.com", "password123", now),
            Err(SessionError::InvalidCredentials)
        );
    }

    #[test]
    fn logout_revokes_the_token() {
        let f = fixture();
        register(&f);
        let now = Utc::now();
        let token = f.sessions.login("alice@example.com", "password123", now).unwrap().access_token;

        assert_eq!(f.sessions.logout(Some(&token)), LogoutOutcome::LoggedOut);
        assert_eq!(f.sessions.authenticate(&token, now), Err(SessionError::Revoked));
    }

    #[test]
    fn logout_without_token_reports_no_session() {
        let f = fixture();
        assert_eq!(f.sessions.logout(None), LogoutOutcome::NoActiveSession);
        assert_eq!(f.sessions.logout(Some("")).message(), "No active session");
        assert!(f.sessions.blacklist().is_empty());
    }

    #[test]
    fn token_of_deleted_user_is_rejected() {
        let f = fixture();
        let alice = register(&f);
        let now = Utc::now();
        let token = f.sessions.login("alice@example.com", "password123", now).unwrap().access_token;

        f.users.remove(alice.id).unwrap();
        assert_eq!(f.sessions.authenticate(&token, now), Err(SessionError::UnknownUser));
    }

    #[test]
    fn expired_token_is_invalid() {
        let f = fixture();
        register(&f);
        let issued = Utc::now();
        let token = f.sessions.login("alice@example.com", "password123", issued).unwrap().access_token;

        let err = f.sessions.authenticate(&token, issued + Duration::hours(2)).unwrap_err();
        assert!(matches!(err, SessionError::InvalidToken(_)));
    }
}
