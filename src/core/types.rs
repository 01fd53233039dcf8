//! Core types for processing results and wire responses.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::processing::ImageHandle;

/// Image facts captured at one point of the pipeline.
///
/// Taken once before any command runs (`original`) and once after all
/// commands and output options are applied (`result`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMetadataSnapshot {
    /// Width and height in pixels
    pub dimensions: (u32, u32),
    /// Upper-case format name, e.g. `JPEG`
    pub format: String,
    pub mimetype: String,
    /// Bits per channel
    pub depth: u8,
    /// Free-form facts about the colour model
    pub metadata: BTreeMap<String, String>,
}

impl ImageMetadataSnapshot {
    pub fn capture(image: &dyn ImageHandle) -> Self {
        Self {
            dimensions: image.dimensions(),
            format: image.format().name().to_string(),
            mimetype: image.mimetype().to_string(),
            depth: image.depth(),
            metadata: image.metadata(),
        }
    }
}

/// Outcome of one processing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingResult {
    pub original: ImageMetadataSnapshot,
    pub result: ImageMetadataSnapshot,
    /// Public URL of the published image
    pub result_url: String,
    /// Size of the published image in bytes
    pub result_filesize: u64,
}

/// Response body of `POST /api/v1/process`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ProcessResponse {
    Ok {
        original: ImageMetadataSnapshot,
        result: ImageMetadataSnapshot,
        url: String,
        filesize: u64,
    },
    Failed {
        code: u16,
        description: String,
    },
}

impl From<ProcessingResult> for ProcessResponse {
    fn from(result: ProcessingResult) -> Self {
        Self::Ok {
            original: result.original,
            result: result.result,
            url: result.result_url,
            filesize: result.result_filesize,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> ImageMetadataSnapshot {
        ImageMetadataSnapshot {
            dimensions: (640, 480),
            format: "JPEG".into(),
            mimetype: "image/jpeg".into(),
            depth: 8,
            metadata: BTreeMap::new(),
        }
    }

    #[test]
    fn success_response_is_flat_with_status_ok() {
        let response = ProcessResponse::from(ProcessingResult {
            original: snapshot(),
            result: snapshot(),
            result_url: "http://cdn/abc.jpeg".into(),
            result_filesize: 1234,
        });
        let json = serde_json::to_value(&response).expect("serialize");
        assert_eq!(json["status"], "ok");
        assert_eq!(json["url"], "http://cdn/abc.jpeg");
        assert_eq!(json["filesize"], 1234);
        assert_eq!(json["original"]["dimensions"], serde_json::json!([640, 480]));
    }

    #[test]
    fn failure_response_carries_code_and_description() {
        let json = serde_json::to_value(ProcessResponse::Failed {
            code: 400,
            description: "Missing \"source\" parameter".into(),
        })
        .expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "status": "failed",
                "code": 400,
                "description": "Missing \"source\" parameter"
            })
        );
    }
}
