//! # Product Lookup Module
//!
//! This module provides the barcode lookup collaborator boundary: a trait
//! the pipeline consumes plus an Open Food Facts HTTP client.
//!
//! Retry with exponential backoff and jitter lives here at the boundary;
//! the pipeline itself never retries. A product that genuinely does not
//! exist is surfaced as `NotFound` immediately, never retried.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::LookupConfig;
use crate::errors::{error_logging, AnalysisError, AppResult};
use crate::ocr::calculate_retry_delay;
use crate::product::RawProductRecord;

/// Product lookup collaborator interface
///
/// One operation: fetch the raw product record for a barcode. Failures
/// surface as `NotFound` (no matching product) or `Upstream` (service
/// unreachable or non-success status).
#[async_trait]
pub trait ProductLookup: Send + Sync {
    async fn fetch(&self, barcode: &str) -> AppResult<RawProductRecord>;
}

/// Response envelope of the Open Food Facts product endpoint
#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    status: u8,
    #[serde(default)]
    product: Option<RawProductRecord>,
}

/// Open Food Facts product lookup client
pub struct OpenFoodFactsClient {
    client: reqwest::Client,
    config: LookupConfig,
}

impl OpenFoodFactsClient {
    /// Build a client with the configured timeout and user agent
    pub fn new(config: LookupConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| {
                AnalysisError::Config(format!("Failed to create HTTP client: {}", e))
            })?;
        Ok(Self { client, config })
    }

    fn product_url(&self, barcode: &str) -> String {
        format!(
            "{}/api/v0/product/{}.json",
            self.config.base_url.trim_end_matches('/'),
            barcode
        )
    }

    /// One lookup attempt without retry handling
    async fn fetch_once(&self, barcode: &str) -> AppResult<RawProductRecord> {
        let url = self.product_url(barcode);
        let response = self.client.get(&url).send().await.map_err(|e| {
            AnalysisError::Upstream(format!("Product lookup request failed: {}", e))
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(AnalysisError::NotFound(format!(
                "No product found for barcode {}",
                barcode
            )));
        }
        if !status.is_success() {
            return Err(AnalysisError::Upstream(format!(
                "Product lookup returned status {}",
                status
            )));
        }

        let body: LookupResponse = response.json().await.map_err(|e| {
            AnalysisError::Upstream(format!("Failed to decode product lookup response: {}", e))
        })?;

        // The product endpoint reports a missing product via status 0
        // rather than an HTTP error
        match (body.status, body.product) {
            (1, Some(product)) => Ok(product),
            _ => Err(AnalysisError::NotFound(format!(
                "No product found for barcode {}",
                barcode
            ))),
        }
    }
}

#[async_trait]
impl ProductLookup for OpenFoodFactsClient {
    /// Fetch a product record, retrying transient upstream failures
    async fn fetch(&self, barcode: &str) -> AppResult<RawProductRecord> {
        let barcode = barcode.trim();
        if barcode.is_empty() || !barcode.chars().all(|c| c.is_ascii_digit()) {
            return Err(AnalysisError::InvalidInput(format!(
                "Barcode must be numeric, got '{}'",
                barcode
            )));
        }

        let mut attempt = 0;
        let max_attempts = self.config.retry.max_retries + 1;

        loop {
            attempt += 1;

            match self.fetch_once(barcode).await {
                Ok(record) => {
                    metrics::counter!("product_lookups_total", "result" => "success")
                        .increment(1);
                    info!(barcode = %barcode, attempt, "Product lookup succeeded");
                    return Ok(record);
                }
                // A missing product stays missing; do not retry
                Err(err @ AnalysisError::NotFound(_)) => {
                    metrics::counter!("product_lookups_total", "result" => "not_found")
                        .increment(1);
                    return Err(err);
                }
                Err(err) => {
                    if attempt >= max_attempts {
                        metrics::counter!("product_lookups_total", "result" => "failure")
                            .increment(1);
                        error_logging::log_lookup_error(
                            &err,
                            "product_fetch_retry",
                            barcode,
                            Some(attempt),
                        );
                        return Err(err);
                    }

                    let delay_ms = calculate_retry_delay(attempt, &self.config.retry);
                    warn!(
                        "Product lookup attempt {attempt} failed: {err}. Retrying in {delay_ms}ms"
                    );
                    tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
                }
            }
        }
    }
}
