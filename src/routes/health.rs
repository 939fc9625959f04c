use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    response::{ApiResponse, Meta},
    state::AppState,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthData {
    pub status: String,
    pub database: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "OK", body = ApiResponse<HealthData>),
    ),
    security(()),
    tag = "Health"
)]
pub async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<HealthData>> {
    let database_up = sqlx::query("SELECT 1").execute(&state.pool).await.is_ok();
    if !database_up {
        tracing::warn!("health check could not reach the database");
    }

    let data = HealthData {
        status: if database_up { "ok" } else { "degraded" }.to_string(),
        database: if database_up { "up" } else { "down" }.to_string(),
    };

    Json(ApiResponse::success(
        "Health check",
        data,
        Some(Meta::empty()),
    ))
}
