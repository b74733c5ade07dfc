//! Axum HTTP handlers for the gateway.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use tracing::{info, warn};

use crate::{
    error::GatewayError,
    models::{ConnectionDescriptor, ResponseEnvelope},
    outcome::AnalysisResult,
    persist::BatchFile,
    validate::validate_batch,
    AppState,
};

// ------------------------------------------------------------------ //
//  /processlist                                                       //
// ------------------------------------------------------------------ //

/// Accept a batch of connection descriptors and relay the analyzer's verdict.
///
/// Always answers 200; success or failure is carried in the envelope.
pub async fn processlist(State(state): State<Arc<AppState>>, request: Request) -> Response {
    match submit_batch(&state, request).await {
        Ok(envelope) => (StatusCode::OK, Json(envelope)).into_response(),
        Err(e) => {
            warn!(error = %e, "processlist request failed");
            e.into_response()
        }
    }
}

async fn submit_batch(state: &AppState, request: Request) -> Result<ResponseEnvelope, GatewayError> {
    if request.method() != Method::POST {
        return Err(GatewayError::MethodNotAllowed);
    }

    let body = axum::body::to_bytes(request.into_body(), state.config.max_body_bytes)
        .await
        .map_err(|_| GatewayError::BodyRead)?;

    let batch: Vec<ConnectionDescriptor> =
        serde_json::from_slice(&body).map_err(GatewayError::MalformedBatch)?;
    validate_batch(&batch)?;

    let file = BatchFile::write(&state.config.data_dir, &batch).await?;
    info!(
        records = batch.len(),
        batch_file = %file.path().display(),
        "batch accepted"
    );

    let stdout = state.analyzer.analyze(file.path()).await?;
    let result: Value =
        serde_json::from_slice(&stdout).map_err(GatewayError::UnparseableOutput)?;

    // Error paths return early and leave the batch file for inspection.
    match AnalysisResult::classify(result) {
        AnalysisResult::ObjectError(msg) => Err(GatewayError::AnalyzerReported(msg)),
        AnalysisResult::ItemError { index, message } => Err(GatewayError::AnalyzerReported(
            format!("Error in item {index}: {message}"),
        )),
        AnalysisResult::Warning(msg) => {
            file.remove().await;
            info!(warning = %msg, "analyzer found no slow log");
            Ok(ResponseEnvelope::warning(format!(
                "Analyzer reported slow log warning: {msg}"
            )))
        }
        AnalysisResult::Findings(findings) => {
            file.remove().await;
            info!("analyzer reported slow sql");
            Ok(ResponseEnvelope::success(findings))
        }
    }
}

// ------------------------------------------------------------------ //
//  Health                                                             //
// ------------------------------------------------------------------ //

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({"status": "ok"})))
}
