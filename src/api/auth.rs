//! Session based authentication.
//!
//! `POST /api/login` accepts the identity claims of a signed-in user, upserts
//! the user record and binds the session to its id. Handlers that need a user
//! take a [`CurrentUser`] argument; requests without a bound session are
//! rejected with 401 before the handler runs.

use super::AppState;
use super::error::ApiError;
use crate::core::models::{UpsertUser, User};
use crate::core::validation::FieldError;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequestParts, State};
use axum::http::StatusCode;
use axum::http::request::Parts;
use tower_sessions::Session;
use tracing::{debug, info};

/// Key for storing user ID in session.
pub const SESSION_USER_ID_KEY: &str = "user_id";

/// The authenticated user of the current request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::Unauthorized)?;
        let user_id: Option<String> = session
            .get(SESSION_USER_ID_KEY)
            .await
            .map_err(|e| ApiError::internal("Failed to read session")(e.into()))?;

        match user_id {
            Some(id) => Ok(CurrentUser { id }),
            None => {
                debug!("Request without an authenticated session");
                Err(ApiError::Unauthorized)
            }
        }
    }
}

fn validate_identity(identity: &UpsertUser) -> Result<(), ApiError> {
    let id = identity.id.trim();
    if id.is_empty() {
        return Err(vec![FieldError::new("id", "Required")].into());
    }
    if id.len() != identity.id.len() || identity.id.chars().any(char::is_control) {
        return Err(vec![FieldError::new(
            "id",
            "Must not contain whitespace padding or control characters",
        )]
        .into());
    }
    Ok(())
}

pub async fn login(
    State(state): State<AppState>,
    session: Session,
    payload: Result<Json<UpsertUser>, JsonRejection>,
) -> Result<Json<User>, ApiError> {
    let Json(identity) = payload?;
    validate_identity(&identity)?;

    // New id on privilege change
    session
        .cycle_id()
        .await
        .map_err(|e| ApiError::internal("Failed to start session")(e.into()))?;
    let user = state
        .store
        .upsert_user(identity)
        .await
        .map_err(ApiError::internal("Failed to log in"))?;
    session
        .insert(SESSION_USER_ID_KEY, &user.id)
        .await
        .map_err(|e| ApiError::internal("Failed to start session")(e.into()))?;

    info!(user_id = %user.id, "User logged in");
    Ok(Json(user))
}

pub async fn logout(session: Session) -> Result<StatusCode, ApiError> {
    session
        .flush()
        .await
        .map_err(|e| ApiError::internal("Failed to log out")(e.into()))?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn current_user(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<User>, ApiError> {
    state
        .store
        .get_user(&user.id)
        .await
        .map_err(ApiError::internal("Failed to fetch user"))?
        .map(Json)
        .ok_or(ApiError::NotFound("User not found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::StaticMarketProvider;
    use crate::store::Stores;
    use std::sync::Arc;

    fn identity(id: &str) -> UpsertUser {
        UpsertUser {
            id: id.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_identity_validation() {
        assert!(validate_identity(&identity("user-42")).is_ok());
        assert!(matches!(
            validate_identity(&identity("")),
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            validate_identity(&identity("  padded ")),
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            validate_identity(&identity("nul\0byte")),
            Err(ApiError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_current_user_without_record_is_not_found() {
        let stores = Stores::memory();
        let state = AppState::new(
            stores.positions,
            Arc::new(StaticMarketProvider::new(Vec::new())),
        );

        let result = current_user(
            State(state),
            CurrentUser {
                id: "ghost".to_string(),
            },
        )
        .await;
        assert!(matches!(result, Err(ApiError::NotFound("User not found"))));
    }
}
