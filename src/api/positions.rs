//! Lending (supply/withdraw) and borrowing (borrow/repay) endpoints.
//!
//! Deleting a position is idempotent: an unknown id, or one owned by another
//! user, still answers 204.
use super::AppState;
use super::auth::CurrentUser;
use super::error::ApiError;
use crate::core::ledger;
use crate::core::models::{BorrowingPosition, LendingPosition, PositionId};
use crate::core::validation::PositionRequest;
use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use tracing::debug;

pub async fn create_lending(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: Result<Json<PositionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<LendingPosition>), ApiError> {
    let Json(request) = payload?;
    let position = request.into_lending()?;

    let created = ledger::supply(state.store.as_ref(), &user.id, position)
        .await
        .map_err(ApiError::internal("Failed to create lending position"))?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_lending(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<LendingPosition>>, ApiError> {
    state
        .store
        .get_lending_positions(&user.id)
        .await
        .map(Json)
        .map_err(ApiError::internal("Failed to fetch lending positions"))
}

pub async fn delete_lending(
    State(state): State<AppState>,
    user: CurrentUser,
    id: Result<Path<PositionId>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    let removed = state
        .store
        .delete_lending_position(&user.id, id)
        .await
        .map_err(ApiError::internal("Failed to delete lending position"))?;
    if !removed {
        debug!(user_id = %user.id, id, "Withdraw of unknown lending position");
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_borrowing(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: Result<Json<PositionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<BorrowingPosition>), ApiError> {
    let Json(request) = payload?;
    let position = request.into_borrowing()?;

    let created = ledger::borrow(state.store.as_ref(), &user.id, position)
        .await
        .map_err(ApiError::internal("Failed to create borrowing position"))?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_borrowing(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<BorrowingPosition>>, ApiError> {
    state
        .store
        .get_borrowing_positions(&user.id)
        .await
        .map(Json)
        .map_err(ApiError::internal("Failed to fetch borrowing positions"))
}

pub async fn delete_borrowing(
    State(state): State<AppState>,
    user: CurrentUser,
    id: Result<Path<PositionId>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    let removed = state
        .store
        .delete_borrowing_position(&user.id, id)
        .await
        .map_err(ApiError::internal("Failed to delete borrowing position"))?;
    if !removed {
        debug!(user_id = %user.id, id, "Repay of unknown borrowing position");
    }
    Ok(StatusCode::NO_CONTENT)
}
