//! Unified error handling for the admin service.
//!
//! Every error is caught at the operation boundary and converted to a JSON
//! body; none is fatal to the process. Repository details are not echoed to
//! clients.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::ScriptError;

/// Application-level error type for the admin service.
#[derive(Debug, Error)]
pub enum AppError {
    /// A script operation failed.
    #[error(transparent)]
    Script(#[from] ScriptError),

    /// A store operation outside the script service failed.
    #[error("storage error: {0}")]
    Repository(#[from] RepositoryError),

    /// Bad request input rejected at the handler.
    #[error("validation failed: {0}")]
    Validation(String),
}

/// JSON error body returned to clients.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

impl AppError {
    fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Repository(_) | Self::Script(ScriptError::Repository(_) | ScriptError::Sync(_))
        )
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Script(ScriptError::Validation(_)) => {
                StatusCode::BAD_REQUEST
            }
            Self::Script(ScriptError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Script(ScriptError::EditConflict) => StatusCode::CONFLICT,
            Self::Script(ScriptError::NotConfigured) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Script(ScriptError::Sync(_)) => StatusCode::BAD_GATEWAY,
            Self::Repository(_) | Self::Script(ScriptError::Repository(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log server-side errors with Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        let status = self.status();

        // Don't expose storage details to clients
        let message = match &self {
            Self::Repository(_) | Self::Script(ScriptError::Repository(_)) => {
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ApiError { error: message })).into_response()
    }
}
