//! Service wiring shared by handlers and middleware.

use std::sync::Arc;

use userguard_auth::{Hs256TokenCodec, TokenBlacklist};
use userguard_core::DomainResult;
use userguard_infra::{InMemoryUserRepository, SessionService, UserService};

use crate::config::AppConfig;

pub type UserStore = Arc<InMemoryUserRepository>;

pub struct AppServices {
    pub users: UserService<UserStore>,
    pub sessions: SessionService<UserStore>,
}

/// Build the process-wide services. The revocation list is created here,
/// once, and handed to the session service.
pub fn build_services(config: &AppConfig) -> DomainResult<AppServices> {
    let store: UserStore = Arc::new(InMemoryUserRepository::new());
    let codec = Arc::new(Hs256TokenCodec::new(config.jwt_secret.as_bytes(), config.jwt_expiration));
    let blacklist = Arc::new(TokenBlacklist::new(codec.clone()));

    let services = AppServices {
        users: UserService::new(store.clone()),
        sessions: SessionService::new(store, codec.clone(), codec, blacklist),
    };

    if config.seed_default_users {
        let created = services.users.seed_defaults()?;
        tracing::info!(created, "seeded default users");
    }

    Ok(services)
}
