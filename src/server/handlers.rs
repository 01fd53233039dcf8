//! HTTP handlers.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use tracing::{debug, info, warn};

use crate::core::{AppState, ProcessResponse, ProcessingTask};
use crate::storage::{ObjectAcl, StorageError};
use crate::utils::ProcessorResult;

/// Liveness probe.
pub async fn hello() -> &'static str {
    "Hello from muto"
}

/// Runs one processing request.
///
/// The body is read as raw bytes so a missing or mistyped `Content-Type`
/// still reaches request validation.
pub async fn process(
    State(state): State<AppState>,
    body: Bytes,
) -> ProcessorResult<Json<ProcessResponse>> {
    let task = ProcessingTask::from_json(&body)?;
    debug!(
        "Received process request for '{}' with {} commands",
        task.source,
        task.commands.len()
    );

    let result = state.processor().execute(task).await?;
    info!(
        "Processed {}x{} -> {}x{} ({} bytes)",
        result.original.dimensions.0,
        result.original.dimensions.1,
        result.result.dimensions.0,
        result.result.dimensions.1,
        result.result_filesize
    );
    Ok(Json(result.into()))
}

/// Serves a published object. Private or missing objects are 404.
pub async fn result_object(State(state): State<AppState>, Path(key): Path<String>) -> Response {
    let storage = state.processor().storage().clone();
    let lookup = tokio::task::spawn_blocking(move || storage.get(&key)).await;

    match lookup {
        Ok(Ok(Some(blob))) if blob.acl == ObjectAcl::PublicRead => {
            ([(header::CONTENT_TYPE, blob.content_type)], blob.bytes).into_response()
        }
        Ok(Ok(_)) | Ok(Err(StorageError::InvalidKey(_))) => StatusCode::NOT_FOUND.into_response(),
        Ok(Err(e)) => {
            warn!("Result lookup failed: {}", e);
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
        Err(e) => {
            warn!("Result lookup panicked: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
