use super::AppState;
use super::auth::CurrentUser;
use super::error::ApiError;
use crate::core::ledger;
use crate::core::metrics::DashboardMetrics;
use crate::core::models::Dashboard;
use axum::Json;
use axum::extract::State;

pub async fn dashboard(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Dashboard>, ApiError> {
    ledger::load_dashboard(state.store.as_ref(), &user.id)
        .await
        .map(Json)
        .map_err(ApiError::internal("Failed to fetch dashboard"))
}

pub async fn metrics(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<DashboardMetrics>, ApiError> {
    let dashboard = ledger::load_dashboard(state.store.as_ref(), &user.id)
        .await
        .map_err(ApiError::internal("Failed to fetch dashboard metrics"))?;
    Ok(Json(DashboardMetrics::calculate(&dashboard)))
}
