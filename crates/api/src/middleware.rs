use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{MatchedPath, Path, State},
    http::{HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;

use userguard_auth::{AccessGuard, Identity, RequestTarget};

use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::{BearerToken, CurrentUser};
use crate::policy::OperationPolicies;

/// Upper bound on request bodies buffered to read their field names.
const MAX_INSPECTED_BODY: usize = 1024 * 1024;

#[derive(Clone)]
pub struct AuthState {
    pub services: Arc<AppServices>,
}

/// Resolve the bearer token to a stored user and attach its identity.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(req.headers())
        .ok_or(ApiError::Unauthorized)?
        .to_string();

    let user = state
        .services
        .sessions
        .authenticate(&token, Utc::now())
        .map_err(|_| ApiError::Unauthorized)?;

    req.extensions_mut().insert(user.identity());
    req.extensions_mut().insert(CurrentUser(user));
    req.extensions_mut().insert(BearerToken(token));

    Ok(next.run(req).await)
}

/// Bearer token from the `Authorization` header, if well-formed.
pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = header.split_once(' ')?;
    if scheme != "Bearer" {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[derive(Clone)]
pub struct GuardState {
    pub guard: AccessGuard,
    pub policies: Arc<OperationPolicies>,
}

/// Enforce the requirement registered for the matched operation.
///
/// Runs after [`auth_middleware`]; a request that reaches it without an
/// identity is treated as unauthenticated.
pub async fn access_guard(
    State(state): State<GuardState>,
    matched: Option<MatchedPath>,
    params: Option<Path<HashMap<String, String>>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let route = matched.as_ref().map(MatchedPath::as_str).unwrap_or_else(|| req.uri().path());
    let Some(requirement) = state.policies.get(req.method(), route).cloned() else {
        return next.run(req).await;
    };
    let operation = format!("{} {}", req.method(), route);

    let mut target = RequestTarget::new();
    if let Some(Path(params)) = params {
        target = target.with_params(params);
    }

    let req = if requirement.reads_body_fields() {
        match buffer_body_fields(req).await {
            Ok((req, fields)) => {
                target = target.with_body_fields(fields);
                req
            }
            Err(err) => return err.into_response(),
        }
    } else {
        req
    };

    let identity = req.extensions().get::<Identity>().copied();
    match state.guard.check(Some(&requirement), identity.as_ref(), &target) {
        Ok(true) => {
            tracing::debug!(%operation, user_id = ?identity.map(|i| i.id.to_string()), "access granted");
            next.run(req).await
        }
        Ok(false) => ApiError::Unauthorized.into_response(),
        Err(denied) => {
            tracing::debug!(%operation, user_id = ?identity.map(|i| i.id.to_string()), "access denied");
            ApiError::from(denied).into_response()
        }
    }
}

/// Read the body once to learn its top-level JSON keys, then put it back.
///
/// Bodies that are not JSON objects contribute no fields; the handler's own
/// extractor reports them.
async fn buffer_body_fields(req: Request<Body>) -> Result<(Request<Body>, Vec<String>), ApiError> {
    let (parts, body) = req.into_parts();
    let bytes = axum::body::to_bytes(body, MAX_INSPECTED_BODY)
        .await
        .map_err(|e| ApiError::BadRequest(format!("failed to read request body: {e}")))?;

    let fields = match serde_json::from_slice::<serde_json::Value>(&bytes) {
        Ok(serde_json::Value::Object(map)) => map.keys().cloned().collect(),
        _ => Vec::new(),
    };

    Ok((Request::from_parts(parts, Body::from(bytes)), fields))
}
