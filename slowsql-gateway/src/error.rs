//! Request-level failures and their envelope rendering.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::{
    analyzer::AnalyzerError, models::ResponseEnvelope, persist::PersistError,
    validate::ValidationError,
};

/// Every way a `/processlist` request can fail.
///
/// All variants render as a failure envelope with HTTP 200; the message is
/// the `Display` text.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Only POST allowed")]
    MethodNotAllowed,
    #[error("Failed to read request body")]
    BodyRead,
    #[error("Invalid JSON array: {0}")]
    MalformedBatch(#[source] serde_json::Error),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Failed to write file: {0}")]
    Persist(#[from] PersistError),
    #[error(transparent)]
    Analyzer(#[from] AnalyzerError),
    #[error("Failed to parse analyzer output: {0}")]
    UnparseableOutput(#[source] serde_json::Error),
    #[error("Analyzer script returned error: {0}")]
    AnalyzerReported(String),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(ResponseEnvelope::failure(self.to_string()))).into_response()
    }
}
