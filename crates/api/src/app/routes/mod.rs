use axum::{
    routing::{get, post},
    Router,
};

pub mod auth;
pub mod system;
pub mod users;

/// Endpoints reachable without a token.
pub fn public() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/auth/login", post(auth::login))
}

/// Endpoints behind authentication and the access guard.
pub fn protected() -> Router {
    Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/auth/abilities", get(auth::abilities))
        .route("/users", post(users::create).get(users::list))
        .route("/users/:id", get(users::get).patch(users::update).delete(users::remove))
}
