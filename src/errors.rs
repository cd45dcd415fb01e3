//! # Application Error Types
//!
//! This module defines the error types used by the configuration, cleanup and
//! scan assembly layers. Product name correction itself never fails: a text
//! that cannot be matched yields an empty, zero-confidence result instead.

use std::fmt;

/// General application error type for consistent error handling
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// Configuration validation errors (catalog, thresholds, substitutions)
    Config(String),
    /// Validation errors (grid positions, inputs, etc.)
    Validation(String),
    /// File system errors
    Io(String),
    /// Serialization / deserialization errors
    Parse(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(msg) => write!(f, "[CONFIG] {}", msg),
            AppError::Validation(msg) => write!(f, "[VALIDATION] {}", msg),
            AppError::Io(msg) => write!(f, "[IO] {}", msg),
            AppError::Parse(msg) => write!(f, "[PARSE] {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Parse(err.to_string())
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// Standardized error logging utilities for consistent error reporting
pub mod error_logging {
    use tracing::error;

    /// Log configuration errors during startup/initialization
    pub fn log_config_error(error: &impl std::fmt::Display, config_key: &str, operation: &str) {
        error!(
            error = %error,
            config_key = %config_key,
            operation = %operation,
            "Configuration error"
        );
    }

    /// Log rejected scan input with the offending grid position
    pub fn log_scan_error(
        error: &impl std::fmt::Display,
        operation: &str,
        row: Option<u32>,
        col: Option<u32>,
        input_value: Option<&str>,
    ) {
        error!(
            error = %error,
            operation = %operation,
            row = ?row,
            col = ?col,
            input_value = ?input_value.map(truncate_for_log),
            "Scan input rejected"
        );
    }

    /// Log file system errors with path context
    pub fn log_io_error(error: &impl std::fmt::Display, operation: &str, path: Option<&str>) {
        error!(
            error = %error,
            operation = %operation,
            path = ?path,
            "File system operation failed"
        );
    }

    fn truncate_for_log(value: &str) -> String {
        if value.chars().count() > 100 {
            format!("{}...", value.chars().take(100).collect::<String>())
        } else {
            value.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_tags() {
        assert_eq!(
            AppError::Config("bad threshold".to_string()).to_string(),
            "[CONFIG] bad threshold"
        );
        assert_eq!(
            AppError::Validation("row 0".to_string()).to_string(),
            "[VALIDATION] row 0"
        );
    }

    #[test]
    fn test_conversions() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert!(matches!(AppError::from(io), AppError::Io(_)));

        let json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(AppError::from(json), AppError::Parse(_)));
    }
}
