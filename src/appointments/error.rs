use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use super::validation::ValidationErrors;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("user is not authenticated")]
    Unauthenticated,
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("failed to read appointments: {0:#}")]
    Read(anyhow::Error),
    #[error("failed to write appointments: {0:#}")]
    Write(anyhow::Error),
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        match self {
            StoreError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": self.to_string() })),
            )
                .into_response(),
            StoreError::Validation(errs) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "error": errs.to_string(), "fields": errs.errors })),
            )
                .into_response(),
            StoreError::Read(_) | StoreError::Write(_) => {
                error!(error = %self, "document store failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": self.to_string() })),
                )
                    .into_response()
            }
        }
    }
}
