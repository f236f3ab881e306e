use crate::core::validation::FieldError;
use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};

/// Errors surfaced by the HTTP handlers. Each renders as JSON
/// `{message, errors?}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid request")]
    Validation(Vec<FieldError>),
    #[error("{0}")]
    BadRequest(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{message}")]
    Internal {
        message: &'static str,
        error: anyhow::Error,
    },
}

impl ApiError {
    /// Adapter for `map_err` that keeps a per-endpoint message for the client
    /// while the underlying error goes to the log.
    pub fn internal(message: &'static str) -> impl FnOnce(anyhow::Error) -> ApiError {
        move |error| ApiError::Internal { message, error }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<FieldError>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        let errors = match self {
            ApiError::Validation(errors) => {
                debug!(?errors, "Rejected invalid request");
                Some(errors)
            }
            ApiError::Internal { message, error } => {
                error!(error = ?error, "{message}");
                None
            }
            _ => None,
        };
        (status, Json(ErrorBody { message, errors })).into_response()
    }
}

impl From<Vec<FieldError>> for ApiError {
    fn from(errors: Vec<FieldError>) -> Self {
        ApiError::Validation(errors)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(vec![FieldError::new("body", rejection.body_text())])
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_error_lists_fields() {
        let response = ApiError::Validation(vec![FieldError::new("amount", "Required")])
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["message"], "Invalid request");
        assert_eq!(body["errors"][0]["path"], "amount");
        assert_eq!(body["errors"][0]["message"], "Required");
    }

    #[tokio::test]
    async fn test_internal_error_hides_cause() {
        let response =
            ApiError::internal("Failed to fetch dashboard")(anyhow!("disk on fire")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["message"], "Failed to fetch dashboard");
        assert!(body.get("errors").is_none());
    }

    #[tokio::test]
    async fn test_status_codes() {
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::NotFound("User not found").status(),
            StatusCode::NOT_FOUND
        );
        let body = body_json(ApiError::NotFound("User not found").into_response()).await;
        assert_eq!(body["message"], "User not found");
    }
}
