//! # OCR Engine Module
//!
//! This module provides the OCR collaborator boundary: a trait the
//! pipeline consumes plus a Tesseract-backed implementation that turns a
//! label photo into per-line text with confidence and bounding boxes.
//!
//! ## Features
//!
//! - Image byte validation using magic-byte format detection
//! - Line reconstruction from Tesseract TSV output (text, mean word
//!   confidence, bounding polygon)
//! - Instance reuse through [`OcrInstanceManager`]
//! - Timeout protection and bounded retries with jitter at this boundary
//!   only; the pipeline itself never retries
//!
//! ## Supported Image Formats
//!
//! PNG, JPEG/JPG, BMP and TIFF. Anything else is rejected before
//! Tesseract ever sees the bytes.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{OcrConfig, RetryConfig};
use crate::errors::{error_logging, AnalysisError, AppResult};
use crate::instance_manager::OcrInstanceManager;
use crate::ocr_text::OcrLine;

/// OCR collaborator interface
///
/// The pipeline never touches image decoding or the underlying
/// recognition model; it only sees recognized lines. Failures surface as
/// `InvalidInput` (undecodable image) or `Upstream` (engine failure).
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Recognize text lines in an encoded image
    async fn recognize(&self, image_bytes: &[u8]) -> AppResult<Vec<OcrLine>>;
}

/// Validate image bytes before OCR processing
///
/// Checks that the payload is non-empty, within the configured size cap,
/// long enough for format detection, and carries the magic bytes of a
/// supported format.
pub fn validate_image_bytes(image_bytes: &[u8], config: &OcrConfig) -> AppResult<()> {
    if image_bytes.is_empty() {
        return Err(AnalysisError::InvalidInput(
            "Image data is empty".to_string(),
        ));
    }

    if image_bytes.len() as u64 > config.max_image_bytes {
        return Err(AnalysisError::InvalidInput(format!(
            "Image too large: {} bytes (maximum allowed: {} bytes)",
            image_bytes.len(),
            config.max_image_bytes
        )));
    }

    if image_bytes.len() < config.min_format_bytes {
        return Err(AnalysisError::InvalidInput(format!(
            "Image data too short for format detection: {} bytes (need at least {})",
            image_bytes.len(),
            config.min_format_bytes
        )));
    }

    match image::guess_format(image_bytes) {
        Ok(format) => {
            // Tesseract supports: PNG, JPEG/JPG, BMP, TIFF
            let supported = matches!(
                format,
                image::ImageFormat::Png
                    | image::ImageFormat::Jpeg
                    | image::ImageFormat::Bmp
                    | image::ImageFormat::Tiff
            );
            if supported {
                info!("Detected supported image format: {format:?}");
                Ok(())
            } else {
                Err(AnalysisError::InvalidInput(format!(
                    "Unsupported image format: {:?}",
                    format
                )))
            }
        }
        Err(e) => Err(AnalysisError::InvalidInput(format!(
            "Could not determine image format: {}",
            e
        ))),
    }
}

/// Calculate retry delay with exponential backoff
///
/// Delay doubles with each attempt, is capped at the configured maximum,
/// and gets a random jitter of up to a quarter of the delay added so
/// concurrent retries spread out.
pub fn calculate_retry_delay(attempt: u32, retry: &RetryConfig) -> u64 {
    #[allow(clippy::cast_precision_loss)]
    let base_delay = retry.base_retry_delay_ms as f64;

    let exponential_delay = base_delay * (2.0_f64).powf(f64::from(attempt.saturating_sub(1)));

    #[allow(clippy::cast_precision_loss)]
    let delay = exponential_delay.min(retry.max_retry_delay_ms as f64) as u64;

    if delay < 4 {
        return delay;
    }
    let jitter = rand::random::<u64>() % (delay / 4);
    delay + jitter
}

/// Tesseract-backed OCR engine
///
/// Holds the OCR configuration and a shared instance manager. Safe to
/// share across request tasks.
pub struct TesseractEngine {
    config: OcrConfig,
    instance_manager: Arc<OcrInstanceManager>,
}

impl TesseractEngine {
    pub fn new(config: OcrConfig) -> Self {
        Self {
            config,
            instance_manager: Arc::new(OcrInstanceManager::new()),
        }
    }

    /// Run one OCR pass over the image bytes with timeout protection
    async fn recognize_once(&self, image_bytes: &[u8]) -> AppResult<Vec<OcrLine>> {
        let instance = self
            .instance_manager
            .get_instance(&self.config)
            .map_err(|e| AnalysisError::Upstream(e.to_string()))?;

        let bytes = image_bytes.to_vec();
        let timeout_duration =
            tokio::time::Duration::from_secs(self.config.operation_timeout_secs);

        let ocr_task = tokio::task::spawn_blocking(move || -> AppResult<String> {
            let mut tess = instance
                .lock()
                .expect("Failed to acquire Tesseract instance lock");
            tess.set_image_from_mem(&bytes).map_err(|e| {
                AnalysisError::InvalidInput(format!("Failed to load image for OCR: {}", e))
            })?;
            tess.get_tsv_text(0).map_err(|e| {
                AnalysisError::Upstream(format!("Failed to extract text from image: {}", e))
            })
        });

        match tokio::time::timeout(timeout_duration, ocr_task).await {
            Ok(Ok(Ok(tsv))) => Ok(parse_tsv_lines(&tsv)),
            Ok(Ok(Err(e))) => Err(e),
            Ok(Err(join_error)) => Err(AnalysisError::Upstream(format!(
                "OCR task failed: {}",
                join_error
            ))),
            Err(_) => Err(AnalysisError::Upstream(format!(
                "OCR operation timed out after {} seconds",
                self.config.operation_timeout_secs
            ))),
        }
    }
}

#[async_trait]
impl OcrEngine for TesseractEngine {
    /// Recognize text lines with validation, retries and backoff
    async fn recognize(&self, image_bytes: &[u8]) -> AppResult<Vec<OcrLine>> {
        let start_time = std::time::Instant::now();

        validate_image_bytes(image_bytes, &self.config)?;

        info!(
            "Starting OCR text extraction from {} byte image",
            image_bytes.len()
        );

        let mut attempt = 0;
        let max_attempts = self.config.retry.max_retries + 1; // +1 for initial attempt

        loop {
            attempt += 1;

            match self.recognize_once(image_bytes).await {
                Ok(lines) => {
                    let total_ms = start_time.elapsed().as_millis();
                    metrics::counter!("ocr_operations_total", "result" => "success").increment(1);
                    metrics::histogram!("ocr_duration_seconds")
                        .record(start_time.elapsed().as_secs_f64());
                    info!(
                        "OCR extraction completed on attempt {} in {}ms, recognized {} lines",
                        attempt,
                        total_ms,
                        lines.len()
                    );
                    return Ok(lines);
                }
                // Invalid input never becomes valid on retry
                Err(err @ AnalysisError::InvalidInput(_)) => {
                    metrics::counter!("ocr_operations_total", "result" => "invalid_input")
                        .increment(1);
                    return Err(err);
                }
                Err(err) => {
                    if attempt >= max_attempts {
                        metrics::counter!("ocr_operations_total", "result" => "failure")
                            .increment(1);
                        error_logging::log_ocr_error(
                            &err,
                            "ocr_extraction_retry",
                            Some(image_bytes.len() as u64),
                            Some(start_time.elapsed()),
                        );
                        return Err(err);
                    }

                    let delay_ms = calculate_retry_delay(attempt, &self.config.retry);
                    warn!("OCR extraction attempt {attempt} failed: {err}. Retrying in {delay_ms}ms");
                    tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
                }
            }
        }
    }
}

/// Reconstruct recognized lines from Tesseract TSV output
///
/// Tesseract's TSV format emits one row per recognized element; word rows
/// (level 5) carry the text, a 0-100 confidence and a pixel rectangle.
/// Words are grouped by their block/paragraph/line indices, joined with
/// single spaces, and each line gets the mean word confidence scaled to
/// [0, 1] plus the axis-aligned union of its word boxes as a 4-point
/// polygon.
pub fn parse_tsv_lines(tsv: &str) -> Vec<OcrLine> {
    struct LineAccumulator {
        words: Vec<String>,
        confidence_sum: f32,
        min_x: f32,
        min_y: f32,
        max_x: f32,
        max_y: f32,
    }

    let mut order: Vec<(u32, u32, u32)> = Vec::new();
    let mut lines: std::collections::HashMap<(u32, u32, u32), LineAccumulator> =
        std::collections::HashMap::new();

    for row in tsv.lines() {
        let fields: Vec<&str> = row.split('\t').collect();
        if fields.len() < 12 {
            continue;
        }
        // Word rows only; headers and structural rows are skipped
        if fields[0] != "5" {
            continue;
        }

        let parse_u32 = |s: &str| s.trim().parse::<u32>().ok();
        let parse_f32 = |s: &str| s.trim().parse::<f32>().ok();

        let key = match (parse_u32(fields[2]), parse_u32(fields[3]), parse_u32(fields[4])) {
            (Some(block), Some(par), Some(line)) => (block, par, line),
            _ => continue,
        };
        let (left, top, width, height, conf) = match (
            parse_f32(fields[6]),
            parse_f32(fields[7]),
            parse_f32(fields[8]),
            parse_f32(fields[9]),
            parse_f32(fields[10]),
        ) {
            (Some(l), Some(t), Some(w), Some(h), Some(c)) => (l, t, w, h, c),
            _ => continue,
        };
        let word = fields[11].trim();
        if word.is_empty() || conf < 0.0 {
            continue;
        }

        let entry = lines.entry(key).or_insert_with(|| {
            order.push(key);
            LineAccumulator {
                words: Vec::new(),
                confidence_sum: 0.0,
                min_x: left,
                min_y: top,
                max_x: left + width,
                max_y: top + height,
            }
        });
        entry.words.push(word.to_string());
        entry.confidence_sum += conf;
        entry.min_x = entry.min_x.min(left);
        entry.min_y = entry.min_y.min(top);
        entry.max_x = entry.max_x.max(left + width);
        entry.max_y = entry.max_y.max(top + height);
    }

    order
        .into_iter()
        .filter_map(|key| lines.remove(&key))
        .map(|acc| {
            let word_count = acc.words.len() as f32;
            OcrLine {
                text: acc.words.join(" "),
                confidence: (acc.confidence_sum / word_count / 100.0).clamp(0.0, 1.0),
                bbox: [
                    [acc.min_x, acc.min_y],
                    [acc.max_x, acc.min_y],
                    [acc.max_x, acc.max_y],
                    [acc.min_x, acc.max_y],
                ],
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OcrConfig;

    #[test]
    fn test_empty_image_rejected() {
        let config = OcrConfig::default();
        let result = validate_image_bytes(&[], &config);
        assert!(matches!(result, Err(AnalysisError::InvalidInput(_))));
    }

    #[test]
    fn test_unknown_format_rejected() {
        let config = OcrConfig::default();
        let garbage = vec![0x00u8; 64];
        let result = validate_image_bytes(&garbage, &config);
        assert!(matches!(result, Err(AnalysisError::InvalidInput(_))));
    }

    #[test]
    fn test_png_magic_bytes_accepted() {
        let config = OcrConfig::default();
        // Minimal PNG header: signature plus IHDR chunk prefix
        let mut png = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        png.extend_from_slice(&[0x00, 0x00, 0x00, 0x0D, b'I', b'H', b'D', b'R']);
        png.extend_from_slice(&[0u8; 16]);
        assert!(validate_image_bytes(&png, &config).is_ok());
    }

    #[test]
    fn test_oversized_image_rejected() {
        let config = OcrConfig {
            max_image_bytes: 16,
            ..Default::default()
        };
        let bytes = vec![0x89u8; 32];
        let result = validate_image_bytes(&bytes, &config);
        assert!(matches!(result, Err(AnalysisError::InvalidInput(_))));
    }

    #[test]
    fn test_retry_delay_grows_and_caps() {
        let retry = RetryConfig::default();
        let delay1 = calculate_retry_delay(1, &retry);
        let delay3 = calculate_retry_delay(3, &retry);
        assert!(delay1 >= retry.base_retry_delay_ms);
        assert!(delay1 <= retry.base_retry_delay_ms + retry.base_retry_delay_ms / 4);
        assert!(delay3 > delay1);
        // Far past the cap: delay stays bounded by max plus jitter
        let delay_big = calculate_retry_delay(20, &retry);
        assert!(delay_big <= retry.max_retry_delay_ms + retry.max_retry_delay_ms / 4);
    }

    #[test]
    fn test_parse_tsv_groups_words_into_lines() {
        let tsv = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext\n\
                   1\t1\t0\t0\t0\t0\t0\t0\t640\t480\t-1\t\n\
                   5\t1\t1\t1\t1\t1\t10\t10\t50\t20\t96.0\tNUTRITION\n\
                   5\t1\t1\t1\t1\t2\t70\t10\t40\t20\t92.0\tFACTS\n\
                   5\t1\t1\t1\t2\t1\t10\t40\t60\t20\t88.0\tEnergy:\n\
                   5\t1\t1\t1\t2\t2\t80\t40\t30\t20\t90.0\t250kcal\n";
        let lines = parse_tsv_lines(tsv);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "NUTRITION FACTS");
        assert!((lines[0].confidence - 0.94).abs() < 1e-4);
        assert_eq!(lines[0].bbox[0], [10.0, 10.0]);
        assert_eq!(lines[0].bbox[2], [110.0, 30.0]);
        assert_eq!(lines[1].text, "Energy: 250kcal");
    }

    #[test]
    fn test_parse_tsv_skips_low_confidence_markers() {
        // conf -1 rows are structural, not words
        let tsv = "5\t1\t1\t1\t1\t1\t0\t0\t10\t10\t-1\tghost\n";
        assert!(parse_tsv_lines(tsv).is_empty());
    }
}
