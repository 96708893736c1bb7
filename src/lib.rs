//! # Label Insight
//!
//! Turns packaged-food label information, either a barcode-resolved
//! product record or OCR-extracted label text, into a structured,
//! personalized health assessment: classified ingredients, deterministic
//! alerts, a 0-100 health score and condition-specific recommendations.

pub mod alerts;
pub mod classification;
pub mod config;
pub mod errors;
pub mod ingredient;
pub mod instance_manager;
pub mod lookup;
pub mod observability;
pub mod ocr;
pub mod ocr_text;
pub mod pipeline;
pub mod product;
pub mod recommendations;
pub mod score;
pub mod server;

// Re-export types for easier access
pub use errors::{AnalysisError, AppResult};
pub use pipeline::{AnalysisReport, LabelAnalyzer, ScanReport};
