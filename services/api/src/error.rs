//! services/api/src/error.rs
//!
//! Defines the error types for the API service: `ApiError` for startup and
//! infrastructure failures, `InteractionError` for a single user action.

use crate::config::ConfigError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use counsel_core::ports::PortError;
use serde::Serialize;
use utoipa::ToSchema;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a single counselling or journaling action did not complete.
///
/// None of these end the session; at most the one interaction is lost, and the
/// retryable variants hand the user's unsent text back in `pending_input`.
#[derive(Debug, thiserror::Error)]
pub enum InteractionError {
    /// Empty input or an unknown counselor. Nothing was changed.
    #[error("{0}")]
    Validation(String),

    #[error("No profile found for {0}")]
    ProfileNotFound(String),

    #[error("Generation failed, please retry: {source}")]
    Generation {
        source: PortError,
        pending_input: String,
    },

    #[error("Saving failed, please retry: {source}")]
    Persistence {
        source: PortError,
        pending_input: Option<String>,
    },

    #[error("The request was cancelled")]
    Cancelled,
}

impl InteractionError {
    pub fn kind(&self) -> &'static str {
        match self {
            InteractionError::Validation(_) => "validation",
            InteractionError::ProfileNotFound(_) => "profile_not_found",
            InteractionError::Generation { .. } => "generation_failed",
            InteractionError::Persistence { .. } => "persistence_failed",
            InteractionError::Cancelled => "cancelled",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            InteractionError::Generation { .. } | InteractionError::Persistence { .. }
        )
    }

    pub fn pending_input(&self) -> Option<&str> {
        match self {
            InteractionError::Generation { pending_input, .. } => Some(pending_input),
            InteractionError::Persistence { pending_input, .. } => pending_input.as_deref(),
            _ => None,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            InteractionError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            InteractionError::ProfileNotFound(_) => StatusCode::NOT_FOUND,
            InteractionError::Generation {
                source: PortError::Timeout(_),
                ..
            } => StatusCode::GATEWAY_TIMEOUT,
            InteractionError::Generation { .. } => StatusCode::BAD_GATEWAY,
            InteractionError::Persistence { .. } => StatusCode::SERVICE_UNAVAILABLE,
            InteractionError::Cancelled => StatusCode::CONFLICT,
        }
    }

    pub fn to_body(&self) -> InteractionErrorBody {
        InteractionErrorBody {
            kind: self.kind().to_string(),
            message: self.to_string(),
            retryable: self.is_retryable(),
            pending_input: self.pending_input().map(str::to_string),
        }
    }
}

/// The JSON body returned for a failed interaction.
#[derive(Debug, Serialize, ToSchema)]
pub struct InteractionErrorBody {
    pub kind: String,
    pub message: String,
    pub retryable: bool,
    pub pending_input: Option<String>,
}

impl IntoResponse for InteractionError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_body())).into_response()
    }
}
