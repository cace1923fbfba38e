//! Health endpoint.

use axum::Json;
use axum::extract::State;

use crate::AppState;
use crate::models::HealthResponse;

/// `GET /health` — liveness plus database connectivity when a pool is set.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_connected = match &state.pool {
        Some(pool) => Some(sqlx::query("SELECT 1").execute(pool).await.is_ok()),
        None => None,
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        version: hr_core::version().to_string(),
        db_connected,
    })
}
