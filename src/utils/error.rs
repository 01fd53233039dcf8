//! Error types for the muto pipeline.
//!
//! Provides a hierarchy of error types using `thiserror`: client-side binding
//! failures surface before anything is sent, server-side failures are converted
//! into the wire failure response by the HTTP layer.

use thiserror::Error;

use crate::storage::StorageError;

/// Validation errors for incoming processing requests.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The request has no (or an empty) `source` reference
    #[error("Missing \"source\" parameter")]
    MissingSource,
    /// The request body could not be read as a processing request
    #[error("Malformed request: {0}")]
    Malformed(String),
    /// Output options are out of range
    #[error("Invalid option: {0}")]
    Option(String),
}

/// Main error type for server-side processing.
///
/// Every variant maps onto a wire failure code through [`ProcessorError::status_code`].
#[derive(Error, Debug)]
pub enum ProcessorError {
    /// Request validation failed before any work started
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Raw command arguments were not in a shape the command accepts
    #[error("{command}: invalid argument shape ({shape}): {reason}")]
    InvalidArgumentShape {
        command: String,
        shape: String,
        reason: String,
    },

    /// No specialised handler and no matching capability on the image handle
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// A well-formed command could not be applied to this image
    #[error("{command} failed: {reason}")]
    OperationFailed { command: String, reason: String },

    /// The source could not be fetched or decoded
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    /// Requested output format is not supported by the backend
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Serialising the final image failed
    #[error("Encode error: {0}")]
    Encode(String),

    /// Writing the result to the storage backend failed
    #[error("Storage write failed: {0}")]
    StorageWrite(#[from] StorageError),

    /// The blocking pipeline job did not complete
    #[error("Processing job failed: {0}")]
    Job(String),
}

/// Convenience result type for processing operations.
pub type ProcessorResult<T> = Result<T, ProcessorError>;

impl ProcessorError {
    pub fn shape(
        command: impl Into<String>,
        shape: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidArgumentShape {
            command: command.into(),
            shape: shape.into(),
            reason: reason.into(),
        }
    }

    pub fn operation(command: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::OperationFailed {
            command: command.into(),
            reason: reason.into(),
        }
    }

    pub fn source<T: Into<String>>(msg: T) -> Self {
        Self::SourceUnavailable(msg.into())
    }

    pub fn format<T: Into<String>>(msg: T) -> Self {
        Self::UnsupportedFormat(msg.into())
    }

    pub fn encode<T: Into<String>>(msg: T) -> Self {
        Self::Encode(msg.into())
    }

    /// Wire failure code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_)
            | Self::InvalidArgumentShape { .. }
            | Self::UnknownCommand(_)
            | Self::UnsupportedFormat(_) => 400,
            Self::OperationFailed { .. } => 422,
            Self::SourceUnavailable(_) => 502,
            Self::StorageWrite(_) => 503,
            Self::Encode(_) | Self::Job(_) => 500,
        }
    }
}

/// Errors raised by the client library.
///
/// Binding errors (`UnknownParameter`, `MissingRequiredParameter`, ...) are
/// raised while building the command list, before any request is sent.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("{operation}() got an unexpected keyword argument '{parameter}'")]
    UnknownParameter { operation: String, parameter: String },

    #[error("{operation}() requires a value for argument '{parameter}'")]
    MissingRequiredParameter { operation: String, parameter: String },

    #[error("{operation}() takes at most {max} positional arguments ({given} given)")]
    TooManyArguments {
        operation: String,
        given: usize,
        max: usize,
    },

    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    #[error("No source set; call from_url() first")]
    MissingSource,

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Server error {code}: {description}")]
    Server { code: u16, description: String },

    #[error("Invalid server response: {0}")]
    InvalidResponse(String),
}

pub type ClientResult<T> = Result<T, ClientError>;

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.to_string())
    }
}
