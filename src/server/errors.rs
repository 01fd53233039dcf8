//! Conversion of pipeline errors into the wire failure response.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use crate::core::ProcessResponse;
use crate::utils::ProcessorError;

impl IntoResponse for ProcessorError {
    fn into_response(self) -> Response {
        let code = self.status_code();
        warn!("Request failed with {}: {}", code, self);

        let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ProcessResponse::Failed {
            code,
            description: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
