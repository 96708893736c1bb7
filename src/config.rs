//! # Unified Application Configuration
//!
//! This module provides a centralized configuration system that
//! consolidates all application settings into a single, structured
//! configuration object. It supports loading from environment variables,
//! validation, and provides a clean interface for accessing configuration
//! throughout the application.

use serde::{Deserialize, Serialize};
use std::env;

use crate::classification::{load_classification_tables, ClassificationTables};
use crate::errors::{AnalysisError, AppResult};

/// Retry behavior for external collaborator calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum retries after the initial attempt
    pub max_retries: u32,
    /// Base delay for the first retry in milliseconds
    pub base_retry_delay_ms: u64,
    /// Cap on the exponential backoff delay in milliseconds
    pub max_retry_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_retry_delay_ms: 1000,
            max_retry_delay_ms: 10000,
        }
    }
}

impl RetryConfig {
    /// Validate retry configuration
    pub fn validate(&self) -> AppResult<()> {
        if self.base_retry_delay_ms == 0 {
            return Err(AnalysisError::Config(
                "Base retry delay cannot be 0".to_string(),
            ));
        }
        if self.max_retry_delay_ms < self.base_retry_delay_ms {
            return Err(AnalysisError::Config(
                "Max retry delay cannot be smaller than base retry delay".to_string(),
            ));
        }
        if self.max_retries > 10 {
            return Err(AnalysisError::Config(
                "Max retries cannot be greater than 10".to_string(),
            ));
        }
        Ok(())
    }
}

/// Product lookup client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupConfig {
    /// Base URL of the product database API
    pub base_url: String,
    /// HTTP client timeout in seconds
    pub timeout_secs: u64,
    /// User agent sent with lookup requests
    pub user_agent: String,
    /// Retry behavior for transient failures
    pub retry: RetryConfig,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            base_url: "https://world.openfoodfacts.org".to_string(),
            timeout_secs: 30,
            user_agent: "label-insight/0.1".to_string(),
            retry: RetryConfig::default(),
        }
    }
}

impl LookupConfig {
    /// Validate lookup configuration
    pub fn validate(&self) -> AppResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(AnalysisError::Config(
                "Lookup base URL cannot be empty".to_string(),
            ));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(AnalysisError::Config(
                "Lookup base URL must start with 'http://' or 'https://'".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(AnalysisError::Config(
                "Lookup timeout cannot be 0".to_string(),
            ));
        }
        if self.timeout_secs > 300 {
            return Err(AnalysisError::Config(
                "Lookup timeout cannot be greater than 300 seconds".to_string(),
            ));
        }
        if self.user_agent.trim().is_empty() {
            return Err(AnalysisError::Config(
                "Lookup user agent cannot be empty".to_string(),
            ));
        }
        self.retry.validate()?;
        Ok(())
    }
}

/// OCR processing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Tesseract language codes, e.g. "eng" or "eng+fra"
    pub languages: String,
    /// Maximum accepted image payload in bytes
    pub max_image_bytes: u64,
    /// Minimum bytes required for magic-byte format detection
    pub min_format_bytes: usize,
    /// Timeout for one OCR pass in seconds
    pub operation_timeout_secs: u64,
    /// Retry behavior for engine failures
    pub retry: RetryConfig,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            languages: "eng".to_string(),
            max_image_bytes: 10 * 1024 * 1024, // 10MB
            min_format_bytes: 8,
            operation_timeout_secs: 30,
            retry: RetryConfig::default(),
        }
    }
}

impl OcrConfig {
    /// Validate OCR configuration
    pub fn validate(&self) -> AppResult<()> {
        if self.languages.trim().is_empty() {
            return Err(AnalysisError::Config(
                "OCR languages cannot be empty".to_string(),
            ));
        }
        if self
            .languages
            .chars()
            .any(|c| !c.is_ascii_lowercase() && c != '+' && c != '_')
        {
            return Err(AnalysisError::Config(format!(
                "OCR languages '{}' contains invalid characters",
                self.languages
            )));
        }
        if self.max_image_bytes == 0 {
            return Err(AnalysisError::Config(
                "Max image bytes cannot be 0".to_string(),
            ));
        }
        if self.min_format_bytes == 0 {
            return Err(AnalysisError::Config(
                "Min format bytes cannot be 0".to_string(),
            ));
        }
        if self.operation_timeout_secs == 0 {
            return Err(AnalysisError::Config(
                "OCR operation timeout cannot be 0".to_string(),
            ));
        }
        if self.operation_timeout_secs > 300 {
            return Err(AnalysisError::Config(
                "OCR operation timeout cannot be greater than 300 seconds".to_string(),
            ));
        }
        self.retry.validate()?;
        Ok(())
    }
}

/// Server configuration for the API and metrics endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// JSON API port
    pub api_port: u16,
    /// Metrics server port
    pub metrics_port: u16,
    /// Whether to allow privileged ports (< 1024)
    pub allow_privileged_ports: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_port: 8000,
            metrics_port: 9090,
            allow_privileged_ports: false,
        }
    }
}

impl ServerConfig {
    /// Validate server configuration
    pub fn validate(&self) -> AppResult<()> {
        if !self.allow_privileged_ports {
            if self.api_port < 1024 {
                return Err(AnalysisError::Config(format!(
                    "API port {} is privileged. Set allow_privileged_ports=true or use port >= 1024",
                    self.api_port
                )));
            }
            if self.metrics_port < 1024 {
                return Err(AnalysisError::Config(format!(
                    "Metrics port {} is privileged. Set allow_privileged_ports=true or use port >= 1024",
                    self.metrics_port
                )));
            }
        }

        if self.api_port == self.metrics_port {
            return Err(AnalysisError::Config(
                "API port and metrics port cannot be the same".to_string(),
            ));
        }

        Ok(())
    }
}

/// Unified application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Product lookup configuration
    pub lookup: LookupConfig,
    /// OCR processing configuration
    pub ocr: OcrConfig,
    /// Classification keyword tables
    pub tables: ClassificationTables,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        let mut config = Self::default();

        config.server.api_port = env::var("API_PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse()
            .map_err(|_| AnalysisError::Config("API_PORT must be a valid port number".to_string()))?;
        config.server.metrics_port = env::var("METRICS_PORT")
            .unwrap_or_else(|_| "9090".to_string())
            .parse()
            .map_err(|_| {
                AnalysisError::Config("METRICS_PORT must be a valid port number".to_string())
            })?;
        config.server.allow_privileged_ports = env::var("ALLOW_PRIVILEGED_PORTS")
            .unwrap_or_else(|_| "false".to_string())
            .to_lowercase()
            == "true";

        if let Ok(base_url) = env::var("PRODUCT_LOOKUP_BASE_URL") {
            config.lookup.base_url = base_url;
        }
        config.lookup.timeout_secs = env::var("PRODUCT_LOOKUP_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .map_err(|_| {
                AnalysisError::Config("PRODUCT_LOOKUP_TIMEOUT_SECS must be a valid number".to_string())
            })?;
        config.lookup.retry.max_retries = env::var("PRODUCT_LOOKUP_MAX_RETRIES")
            .unwrap_or_else(|_| "2".to_string())
            .parse()
            .map_err(|_| {
                AnalysisError::Config("PRODUCT_LOOKUP_MAX_RETRIES must be a valid number".to_string())
            })?;

        if let Ok(languages) = env::var("OCR_LANGUAGES") {
            config.ocr.languages = languages;
        }
        config.ocr.max_image_bytes = env::var("OCR_MAX_IMAGE_BYTES")
            .unwrap_or_else(|_| (10 * 1024 * 1024).to_string())
            .parse()
            .map_err(|_| {
                AnalysisError::Config("OCR_MAX_IMAGE_BYTES must be a valid number".to_string())
            })?;
        config.ocr.operation_timeout_secs = env::var("OCR_OPERATION_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .map_err(|_| {
                AnalysisError::Config("OCR_OPERATION_TIMEOUT_SECS must be a valid number".to_string())
            })?;

        // Classification tables come from their own file-based loader
        config.tables = load_classification_tables();

        Ok(config)
    }

    /// Validate all configuration sections
    pub fn validate(&self) -> AppResult<()> {
        self.server.validate()?;
        self.lookup.validate()?;
        self.ocr.validate()?;
        self.tables.validate()?;
        Ok(())
    }

    /// Get a summary of the current configuration for logging
    pub fn summary(&self) -> String {
        format!(
            "Configuration: api_port={}, metrics_port={}, lookup_base_url={}, ocr_languages={}, hidden_sugars={}, harmful_additives={}",
            self.server.api_port,
            self.server.metrics_port,
            self.lookup.base_url,
            self.ocr.languages,
            self.tables.hidden_sugars.len(),
            self.tables.harmful_additives.len()
        )
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            lookup: LookupConfig::default(),
            ocr: OcrConfig::default(),
            tables: ClassificationTables::default(),
        }
    }
}
