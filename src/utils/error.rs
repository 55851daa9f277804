use thiserror::Error;

#[derive(Error, Debug)]
pub enum VisionError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Image encoding error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid configuration value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Failed to decode frame '{source_name}': {message}")]
    FrameDecodeError { source_name: String, message: String },

    #[error("Size mismatch: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("Frame processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Processing,
    Output,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl VisionError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            VisionError::ConfigError { .. }
            | VisionError::InvalidConfigValueError { .. }
            | VisionError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            VisionError::FrameDecodeError { .. } => ErrorCategory::Input,
            VisionError::DimensionMismatch { .. } | VisionError::ProcessingError { .. } => {
                ErrorCategory::Processing
            }
            VisionError::ZipError(_)
            | VisionError::CsvError(_)
            | VisionError::SerializationError(_)
            | VisionError::ImageError(_) => ErrorCategory::Output,
            VisionError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Input => ErrorSeverity::Medium,
            ErrorCategory::Processing => ErrorSeverity::High,
            ErrorCategory::Output => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            VisionError::IoError(_) => {
                "Check that the input directory exists and the output path is writable"
            }
            VisionError::FrameDecodeError { .. } => {
                "Check the frame format (--format) and frame size match the capture"
            }
            VisionError::InvalidConfigValueError { .. }
            | VisionError::ConfigValidationError { .. }
            | VisionError::ConfigError { .. } => "Fix the configuration value and try again",
            VisionError::DimensionMismatch { .. } => {
                "All frames in a run must share the configured width and height"
            }
            VisionError::ProcessingError { .. } => "Re-run with --verbose to inspect the failing frame",
            VisionError::ZipError(_)
            | VisionError::CsvError(_)
            | VisionError::SerializationError(_)
            | VisionError::ImageError(_) => "Check free disk space and output permissions",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            VisionError::FrameDecodeError {
                source_name,
                message,
            } => format!("Could not read frame {}: {}", source_name, message),
            VisionError::IoError(e) => format!("File system error: {}", e),
            VisionError::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid setting '{}': {}", field, reason)
            }
            other => other.to_string(),
        }
    }
}

impl From<toml::de::Error> for VisionError {
    fn from(err: toml::de::Error) -> Self {
        VisionError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", err),
        }
    }
}

pub type Result<T> = std::result::Result<T, VisionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_is_medium_input_error() {
        let err = VisionError::FrameDecodeError {
            source_name: "frame_01.bin".to_string(),
            message: "truncated".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Input);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert!(err.user_friendly_message().contains("frame_01.bin"));
    }

    #[test]
    fn test_io_error_is_critical() {
        let err: VisionError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn test_toml_error_maps_to_config_validation() {
        let err: VisionError = toml::from_str::<toml::Value>("= broken").unwrap_err().into();
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }
}
