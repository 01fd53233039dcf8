use std::str::FromStr;
use crate::core::{OutputOptions, ProcessingTask};
use crate::utils::{ImageFormat, ValidationError};

/// Validates a processing task before it is queued
pub fn validate_task(task: &ProcessingTask) -> Result<(), ValidationError> {
    validate_source(&task.source)?;
    validate_options(&task.opts)?;
    Ok(())
}

/// Validates the source reference is present
pub fn validate_source(source: &str) -> Result<(), ValidationError> {
    if source.trim().is_empty() {
        return Err(ValidationError::MissingSource);
    }
    Ok(())
}

/// Validates output options: a known format and a quality in range for it
pub fn validate_options(opts: &OutputOptions) -> Result<(), ValidationError> {
    let format = match &opts.format {
        Some(name) => Some(
            ImageFormat::from_str(name)
                .map_err(|_| ValidationError::Option(format!("unsupported format '{}'", name)))?,
        ),
        None => None,
    };

    if let Some(quality) = opts.compression_quality {
        // Without an explicit format the source format decides; use the strict range.
        let in_range = match format {
            Some(format) => format.validate_quality(quality),
            None => (1..=100).contains(&quality),
        };
        if !in_range {
            return Err(ValidationError::Option(format!(
                "Invalid compression_quality: {}. Must be between 1 and 100",
                quality
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(format: Option<&str>, quality: Option<i64>) -> OutputOptions {
        OutputOptions {
            format: format.map(str::to_string),
            compression_quality: quality,
        }
    }

    #[test]
    fn accepts_empty_and_valid_options() {
        assert!(validate_options(&opts(None, None)).is_ok());
        assert!(validate_options(&opts(Some("jpg"), Some(85))).is_ok());
        assert!(validate_options(&opts(Some("png"), Some(0))).is_ok());
    }

    #[test]
    fn rejects_unknown_format_and_out_of_range_quality() {
        assert!(validate_options(&opts(Some("psd"), None)).is_err());
        assert!(validate_options(&opts(None, Some(0))).is_err());
        assert!(validate_options(&opts(Some("jpeg"), Some(150))).is_err());
    }

    #[test]
    fn blank_source_is_missing() {
        assert_eq!(validate_source("  "), Err(ValidationError::MissingSource));
    }
}
