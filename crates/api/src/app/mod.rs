//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: user store, token codec, blacklist, sessions
//! - `routes/`: HTTP handlers (one file per area)
//! - `dto.rs`: response envelope and request bodies
//! - `errors.rs`: error → status/envelope mapping

use std::sync::Arc;

use axum::{Extension, Router};
use tower::ServiceBuilder;

use userguard_auth::AccessGuard;
use userguard_core::DomainResult;

use crate::config::AppConfig;
use crate::middleware::{self, AuthState, GuardState};
use crate::policy::{self, OperationPolicies};

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(config: &AppConfig) -> DomainResult<Router> {
    let services = Arc::new(services::build_services(config)?);
    Ok(router(services, policy::user_policies()))
}

/// Router over already-built services and a policy registry.
pub fn router(services: Arc<services::AppServices>, policies: OperationPolicies) -> Router {
    let auth_state = AuthState {
        services: services.clone(),
    };
    let guard_state = GuardState {
        guard: AccessGuard::new(),
        policies: Arc::new(policies),
    };

    // Layers run bottom-up: authenticate, then check the operation's requirement.
    let protected = routes::protected()
        .route_layer(axum::middleware::from_fn_with_state(guard_state, middleware::access_guard))
        .route_layer(axum::middleware::from_fn_with_state(auth_state, middleware::auth_middleware));

    Router::new()
        .merge(routes::public())
        .merge(protected)
        .layer(ServiceBuilder::new().layer(Extension(services)))
}
