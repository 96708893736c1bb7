//! # OCR Instance Manager Module
//!
//! This module provides thread-safe OCR instance management for reusing
//! Tesseract instances. Reusing instances significantly improves
//! performance by avoiding initialization overhead.

use leptess::LepTess;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::info;

use crate::config::OcrConfig;

/// Thread-safe OCR instance manager for reusing Tesseract instances
///
/// Manages a pool of Tesseract OCR instances keyed by language
/// configuration. Creating a Tesseract instance costs hundreds of
/// milliseconds; reusing one per language makes repeated label scans
/// cheap.
///
/// # Thread Safety
///
/// Uses `Mutex<HashMap<>>` internally for thread-safe instance
/// management. Multiple request tasks can safely request instances
/// concurrently; each instance is itself wrapped in a `Mutex` because
/// Tesseract processing needs exclusive access.
pub struct OcrInstanceManager {
    instances: Mutex<HashMap<String, Arc<Mutex<LepTess>>>>,
}

impl OcrInstanceManager {
    /// Create a new OCR instance manager with an empty pool
    pub fn new() -> Self {
        Self {
            instances: Mutex::new(HashMap::new()),
        }
    }

    /// Get or create an OCR instance for the given configuration
    ///
    /// Returns an existing instance if one exists for the language
    /// configuration, otherwise creates a new instance and stores it for
    /// future reuse.
    ///
    /// # Errors
    ///
    /// Returns an error if Tesseract instance creation fails (e.g.
    /// missing language data files).
    pub fn get_instance(&self, config: &OcrConfig) -> anyhow::Result<Arc<Mutex<LepTess>>> {
        let key = config.languages.clone();

        // Try to get existing instance
        {
            let instances = self
                .instances
                .lock()
                .expect("Failed to acquire instances lock");
            if let Some(instance) = instances.get(&key) {
                return Ok(Arc::clone(instance));
            }
        }

        info!(
            "Creating new OCR instance for languages: {}",
            config.languages
        );

        let mut tess = LepTess::new(None, &config.languages)
            .map_err(|e| anyhow::anyhow!("Failed to initialize Tesseract OCR instance: {}", e))?;

        // Automatic page segmentation suits free-form label photos
        tess.set_variable(leptess::Variable::TesseditPagesegMode, "3")
            .map_err(|e| anyhow::anyhow!("Failed to set PSM mode: {}", e))?;

        let instance = Arc::new(Mutex::new(tess));

        // Store the instance
        {
            let mut instances = self
                .instances
                .lock()
                .expect("Failed to acquire instances lock");
            instances.insert(key, Arc::clone(&instance));
        }

        Ok(instance)
    }

    /// Get the number of cached instances
    pub fn instance_count(&self) -> usize {
        let instances = self
            .instances
            .lock()
            .expect("Failed to acquire instances lock");
        instances.len()
    }
}

impl Default for OcrInstanceManager {
    fn default() -> Self {
        Self::new()
    }
}
