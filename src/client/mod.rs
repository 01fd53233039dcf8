//! Client library: build a command pipeline, send it, read the result back.
//!
//! The client uses blocking HTTP and must not be driven from inside an async
//! runtime thread.

mod builder;
mod processed;
pub mod schema;

pub use builder::CommandBinder;
pub use processed::ProcessedImage;

use tracing::debug;

use crate::core::{Command, ProcessResponse, ProcessingRequest};
use crate::utils::{ClientError, ClientResult};

/// Accumulates a source, commands and output settings for one processing call.
#[derive(Debug, Clone)]
pub struct MutoClient {
    api_endpoint: String,
    source: Option<String>,
    commands: Vec<Command>,
    format: Option<String>,
    compression_quality: Option<i64>,
}

impl MutoClient {
    /// `api_endpoint` is the API root, e.g. `http://localhost:5000/api/v1`.
    pub fn new(api_endpoint: impl Into<String>) -> Self {
        Self {
            api_endpoint: api_endpoint.into().trim_end_matches('/').to_string(),
            source: None,
            commands: Vec::new(),
            format: None,
            compression_quality: None,
        }
    }

    pub fn from_url(&mut self, url: impl Into<String>) -> &mut Self {
        self.source = Some(url.into());
        self
    }

    /// Output format, e.g. `jpeg` or `png`. Unset keeps the source format.
    pub fn format(&mut self, format: impl Into<String>) -> &mut Self {
        self.format = Some(format.into());
        self
    }

    pub fn compression_quality(&mut self, quality: i64) -> &mut Self {
        self.compression_quality = Some(quality);
        self
    }

    pub fn resize(&mut self) -> CommandBinder<'_> {
        self.op("resize")
    }

    pub fn crop(&mut self) -> CommandBinder<'_> {
        self.op("crop")
    }

    pub fn transform(&mut self) -> CommandBinder<'_> {
        self.op("transform")
    }

    pub fn liquid_rescale(&mut self) -> CommandBinder<'_> {
        self.op("liquid_rescale")
    }

    pub fn rotate(&mut self) -> CommandBinder<'_> {
        self.op("rotate")
    }

    pub fn flip(&mut self) -> CommandBinder<'_> {
        self.op("flip")
    }

    pub fn flop(&mut self) -> CommandBinder<'_> {
        self.op("flop")
    }

    pub fn transparentize(&mut self) -> CommandBinder<'_> {
        self.op("transparentize")
    }

    /// Binder for any registered operation by name.
    pub fn op(&mut self, name: impl Into<String>) -> CommandBinder<'_> {
        CommandBinder::new(self, name)
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub(crate) fn push(&mut self, command: Command) {
        self.commands.push(command);
    }

    /// Packages the current state into a request payload.
    pub fn request(&self) -> ClientResult<ProcessingRequest> {
        ProcessingRequest::assemble(
            self.source.as_deref(),
            &self.commands,
            self.format.as_deref(),
            self.compression_quality,
        )
        .ok_or(ClientError::MissingSource)
    }

    /// Sends the request to `{api_endpoint}/process` and waits for the result.
    pub fn process(&self) -> ClientResult<ProcessedImage> {
        let request = self.request()?;
        let url = format!("{}/process", self.api_endpoint);
        debug!("POST {} ({} commands)", url, request.commands.len());

        let response = reqwest::blocking::Client::new()
            .post(&url)
            .json(&request)
            .send()?;
        let status = response.status();
        let body = response.text()?;

        match serde_json::from_str::<ProcessResponse>(&body) {
            Ok(ProcessResponse::Ok {
                original,
                result,
                url,
                filesize,
            }) => Ok(ProcessedImage::new(original, result, url, filesize)),
            Ok(ProcessResponse::Failed { code, description }) => {
                Err(ClientError::Server { code, description })
            }
            Err(e) => Err(ClientError::InvalidResponse(format!("HTTP {status}: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_requires_a_source() {
        let client = MutoClient::new("http://localhost:5000/api/v1");
        assert!(matches!(client.request(), Err(ClientError::MissingSource)));
    }

    #[test]
    fn unset_options_are_omitted_from_the_payload() {
        let mut client = MutoClient::new("http://localhost:5000/api/v1/");
        client.from_url("https://example.com/cat.jpg");
        client.flip().bind().expect("flip");

        let payload = serde_json::to_value(client.request().expect("request")).expect("json");
        assert_eq!(
            payload,
            json!({
                "source": "https://example.com/cat.jpg",
                "commands": [["flip", {}]],
                "opts": {}
            })
        );

        client.format("png").compression_quality(80);
        let payload = serde_json::to_value(client.request().expect("request")).expect("json");
        assert_eq!(payload["opts"], json!({"format": "png", "compression_quality": 80}));
    }

    #[test]
    fn unreachable_server_is_an_http_error() {
        let mut client = MutoClient::new("http://127.0.0.1:1/api/v1");
        client.from_url("https://example.com/cat.jpg");
        assert!(matches!(client.process(), Err(ClientError::Http(_))));
    }
}
