use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use userguard_auth::AuthzError;
use userguard_core::DomainError;
use userguard_infra::SessionError;

use crate::app::dto::ApiResponse;

/// Every failure a handler or middleware can surface, mapped to an envelope
/// in one place.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error(transparent)]
    Forbidden(#[from] AuthzError),

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Domain(e) => match e {
                DomainError::Validation(_) | DomainError::InvalidId(_) => StatusCode::BAD_REQUEST,
                DomainError::NotFound(_) => StatusCode::NOT_FOUND,
                DomainError::Conflict(_) => StatusCode::CONFLICT,
                DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Session(e) => match e {
                SessionError::Issue(_) => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::UNAUTHORIZED,
            },
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Token and internal details stay in the logs.
    fn public_message(&self) -> String {
        match self {
            ApiError::Session(SessionError::InvalidCredentials) => "Invalid credentials".to_string(),
            ApiError::Session(SessionError::Issue(_)) | ApiError::Internal(_) => {
                "Internal server error".to_string()
            }
            ApiError::Domain(DomainError::Internal(_)) => "Internal server error".to_string(),
            ApiError::Session(_) => "Unauthorized".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(ApiResponse::<()>::error(self.public_message()))).into_response()
    }
}
