use axum::Json;

use crate::app::dto::{ApiResponse, HealthStatus};

pub async fn health() -> Json<ApiResponse<HealthStatus>> {
    Json(ApiResponse::success("OK", HealthStatus { status: "ok" }))
}
