//! Session endpoints.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension},
    Json,
};
use chrono::Utc;

use userguard_auth::{ability_for, Identity, PermissionRule, User};
use userguard_infra::LoginResult;

use crate::app::dto::{ApiResponse, LoginRequest};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::{BearerToken, CurrentUser};

/// POST /auth/login
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<LoginResult>>, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    // Password verification is CPU-bound.
    let result = tokio::task::spawn_blocking(move || {
        services.sessions.login(&body.email, &body.password, Utc::now())
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok(Json(ApiResponse::success("Successfully logged in", result)))
}

/// POST /auth/logout
pub async fn logout(
    Extension(services): Extension<Arc<AppServices>>,
    token: Option<Extension<BearerToken>>,
) -> Json<ApiResponse<()>> {
    let token = token.as_ref().map(|Extension(t)| t.as_str());
    let outcome = services.sessions.logout(token);
    Json(ApiResponse::message(outcome.message()))
}

/// GET /auth/me
pub async fn me(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<ApiResponse<User>> {
    Json(ApiResponse::success("User profile retrieved successfully", user))
}

/// GET /auth/abilities: the caller's own rule list.
pub async fn abilities(Extension(identity): Extension<Identity>) -> Json<ApiResponse<Vec<PermissionRule>>> {
    let ability = ability_for(&identity);
    Json(ApiResponse::success(
        "Abilities retrieved successfully",
        ability.rules().to_vec(),
    ))
}
