pub mod error;
pub mod validation;
pub mod formats;

pub use error::{ClientError, ClientResult, ProcessorError, ProcessorResult, ValidationError};
pub use validation::{validate_options, validate_source, validate_task};
pub use formats::ImageFormat;
