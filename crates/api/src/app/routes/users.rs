//! User management endpoints.
//!
//! Permission checks happen in the access guard before these handlers run;
//! see `crate::policy::user_policies`.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Path, Query,
    },
    http::StatusCode,
    Json,
};

use userguard_auth::User;
use userguard_core::{DomainResult, UserId};
use userguard_infra::{NewUser, Page, UserPatch, UserQuery};

use crate::app::dto::ApiResponse;
use crate::app::errors::ApiError;
use crate::app::services::AppServices;

fn parse_id(raw: &str) -> Result<UserId, ApiError> {
    raw.parse::<UserId>().map_err(ApiError::from)
}

/// Run a (possibly password-hashing) service call off the async runtime.
async fn blocking<T, F>(services: Arc<AppServices>, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&AppServices) -> DomainResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || f(&services))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(ApiError::from)
}

/// POST /users
pub async fn create(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<NewUser>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<User>>), ApiError> {
    let Json(body) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let user = blocking(services, move |s| s.users.create(body)).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("User created successfully", user)),
    ))
}

/// GET /users
pub async fn list(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Page<User>>>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let page = services.users.find_all(&query)?;
    Ok(Json(ApiResponse::success("Users retrieved successfully", page)))
}

/// GET /users/:id
pub async fn get(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let user = services.users.find_by_id(parse_id(&id)?)?;
    Ok(Json(ApiResponse::success("User retrieved successfully", user)))
}

/// PATCH /users/:id
pub async fn update(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<UserPatch>, JsonRejection>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let id = parse_id(&id)?;
    let Json(patch) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let user = blocking(services, move |s| s.users.update(id, patch)).await?;
    Ok(Json(ApiResponse::success("User updated successfully", user)))
}

/// DELETE /users/:id
pub async fn remove(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    services.users.remove(parse_id(&id)?)?;
    Ok(Json(ApiResponse::message("User deleted successfully")))
}
