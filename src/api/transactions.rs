use super::AppState;
use super::auth::CurrentUser;
use super::error::ApiError;
use crate::core::models::Transaction;
use axum::Json;
use axum::extract::State;

pub async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<Transaction>>, ApiError> {
    state
        .store
        .get_transactions(&user.id)
        .await
        .map(Json)
        .map_err(ApiError::internal("Failed to fetch transactions"))
}
