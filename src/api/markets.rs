use super::AppState;
use super::error::ApiError;
use crate::core::market::Market;
use axum::Json;
use axum::extract::State;

/// Public market table; no session required.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Market>>, ApiError> {
    state
        .markets
        .markets()
        .await
        .map(Json)
        .map_err(ApiError::internal("Failed to fetch markets"))
}
