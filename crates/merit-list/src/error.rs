//! Error types for the merit list service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::ingestion::PipelineStage;

/// Result type alias for merit list operations
pub type Result<T> = std::result::Result<T, Error>;

/// Merit list service errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed or disallowed input; raised before any side effect
    #[error("Validation error: {0}")]
    Validation(String),

    /// Referenced collection, record or filter result is absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// An external pipeline stage failed
    #[error("Pipeline stage '{stage}' failed: {message}")]
    Stage {
        stage: PipelineStage,
        message: String,
    },

    /// Underlying store unreachable or operation failed
    #[error("Store error: {0}")]
    Store(String),

    /// Create was attempted for a collection that already exists.
    /// The collection registry treats this as success.
    #[error("Collection already exists: {0}")]
    CollectionExists(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a not-found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a stage error
    pub fn stage(stage: PipelineStage, message: impl Into<String>) -> Self {
        Self::Stage {
            stage,
            message: message.into(),
        }
    }

    /// Create a store error
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Pipeline stage this error is tagged with, if any
    pub fn failed_stage(&self) -> Option<PipelineStage> {
        match self {
            Error::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Store(err.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let stage = self.failed_stage();
        let (status, error_type, message) = match &self {
            Error::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error", msg.clone()),
            Error::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg.clone()),
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            Error::Stage { stage, message } => (
                StatusCode::BAD_GATEWAY,
                "pipeline_stage_error",
                format!("{} stage failed: {}", stage, message),
            ),
            Error::Store(msg) => (StatusCode::SERVICE_UNAVAILABLE, "store_error", msg.clone()),
            Error::CollectionExists(name) => (
                StatusCode::CONFLICT,
                "collection_exists",
                format!("Collection already exists: {}", name),
            ),
            Error::Io(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "io_error",
                err.to_string(),
            ),
            Error::Json(err) => (StatusCode::BAD_REQUEST, "json_error", err.to_string()),
            Error::Csv(err) => (StatusCode::INTERNAL_SERVER_ERROR, "csv_error", err.to_string()),
            Error::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg.clone())
            }
        };

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": message,
                "stage": stage,
            }
        }));

        (status, body).into_response()
    }
}
