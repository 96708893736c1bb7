//! # Application Error Types
//!
//! This module defines common error types used throughout the label-insight
//! application. It provides structured error handling for the analysis
//! pipeline and its external collaborators.

use std::fmt;

/// General application error type for consistent error handling
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Configuration validation errors
    Config(String),
    /// No product matched the given barcode
    NotFound(String),
    /// Unparseable input (undecodable image data, missing required field)
    InvalidInput(String),
    /// An external collaborator failed (product lookup unreachable or
    /// returned a non-success status, OCR engine failed to initialize)
    Upstream(String),
    /// Unexpected failure inside parsing/scoring. The pipeline is total
    /// over any syntactically valid input, so this path should stay
    /// unreachable, but it is still mapped rather than left to crash.
    Internal(String),
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::Config(msg) => write!(f, "[CONFIG] {}", msg),
            AnalysisError::NotFound(msg) => write!(f, "[NOT_FOUND] {}", msg),
            AnalysisError::InvalidInput(msg) => write!(f, "[INVALID_INPUT] {}", msg),
            AnalysisError::Upstream(msg) => write!(f, "[UPSTREAM] {}", msg),
            AnalysisError::Internal(msg) => write!(f, "[INTERNAL] {}", msg),
        }
    }
}

impl std::error::Error for AnalysisError {}

impl From<anyhow::Error> for AnalysisError {
    fn from(err: anyhow::Error) -> Self {
        AnalysisError::Internal(err.to_string())
    }
}

impl From<reqwest::Error> for AnalysisError {
    fn from(err: reqwest::Error) -> Self {
        AnalysisError::Upstream(err.to_string())
    }
}

impl AnalysisError {
    /// Stable machine-readable kind tag, used in API error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::Config(_) => "config_error",
            AnalysisError::NotFound(_) => "not_found",
            AnalysisError::InvalidInput(_) => "invalid_input",
            AnalysisError::Upstream(_) => "upstream_unavailable",
            AnalysisError::Internal(_) => "internal_error",
        }
    }

    /// Human-readable message without the `[TAG]` prefix
    pub fn message(&self) -> &str {
        match self {
            AnalysisError::Config(msg)
            | AnalysisError::NotFound(msg)
            | AnalysisError::InvalidInput(msg)
            | AnalysisError::Upstream(msg)
            | AnalysisError::Internal(msg) => msg,
        }
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AnalysisError>;

/// Standardized error logging utilities for consistent error reporting across the application
pub mod error_logging {
    use tracing::error;

    /// Log product lookup errors with barcode context
    pub fn log_lookup_error(
        error: &impl std::fmt::Display,
        operation: &str,
        barcode: &str,
        attempt_count: Option<u32>,
    ) {
        error!(
            error = %error,
            operation = %operation,
            barcode = %barcode,
            attempt_count = ?attempt_count,
            "Product lookup failed"
        );
    }

    /// Log OCR processing errors with image and processing context
    pub fn log_ocr_error(
        error: &impl std::fmt::Display,
        operation: &str,
        image_size: Option<u64>,
        processing_duration: Option<std::time::Duration>,
    ) {
        error!(
            error = %error,
            operation = %operation,
            image_size_bytes = ?image_size,
            processing_duration_ms = ?processing_duration.map(|d| d.as_millis()),
            "OCR processing failed"
        );
    }

    /// Log pipeline errors with request context
    pub fn log_pipeline_error(error: &impl std::fmt::Display, operation: &str) {
        error!(
            error = %error,
            operation = %operation,
            "Label analysis failed"
        );
    }

    /// Log configuration errors during startup/initialization
    pub fn log_config_error(error: &impl std::fmt::Display, config_key: &str, operation: &str) {
        error!(
            error = %error,
            config_key = %config_key,
            operation = %operation,
            "Configuration error"
        );
    }
}
