use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::food_entries::{
    repo::StoreError,
    services::{EntryError, ValidationError},
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("food entry {0} not found")]
    NotFound(Uuid),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<EntryError> for AppError {
    fn from(e: EntryError) -> Self {
        match e {
            EntryError::NotFound(id) => AppError::NotFound(id),
            EntryError::Validation(v) => AppError::Validation(v),
            EntryError::Store(s) => AppError::Store(s),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found", self.to_string()),
            AppError::Validation(e) => {
                tracing::warn!(error = %e, "rejected food entry form");
                (StatusCode::BAD_REQUEST, "validation_error", e.to_string())
            }
            AppError::Store(StoreError::Unavailable(e)) => {
                tracing::error!(error = %e, "database unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "unavailable",
                    "the database is unavailable, try again later".to_string(),
                )
            }
            AppError::Store(StoreError::Constraint(e)) => {
                tracing::warn!(error = %e, "constraint violation");
                (
                    StatusCode::CONFLICT,
                    "conflict",
                    "the change conflicts with existing data".to_string(),
                )
            }
            AppError::Store(StoreError::Other(e)) => {
                tracing::error!(error = %e, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "an internal error occurred".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": code, "message": message }))).into_response()
    }
}
