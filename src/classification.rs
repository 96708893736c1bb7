//! # Classification Tables Module
//!
//! This module provides the keyword vocabularies used to classify
//! ingredients and OCR label text.
//!
//! ## Features
//!
//! - Hidden-sugar, harmful-additive and healthy-keyword vocabularies for
//!   ingredient classification
//! - Nutrition, marketing and slogan vocabularies for OCR line bucketing
//! - JSON file loading with environment variable override
//! - Compiled-in defaults so the service starts without a config file
//!
//! The tables are loaded once at process startup and shared read-only
//! across concurrently executing analyses.

use serde::{Deserialize, Serialize};
use std::fs;
use tracing::{info, warn};

use crate::errors::{AnalysisError, AppResult};

/// Keyword vocabularies driving ingredient and OCR text classification
///
/// Every list is matched by lower-cased substring containment. The tables
/// are immutable after startup; components receive them via `Arc` so tests
/// can substitute custom tables.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClassificationTables {
    /// Sugar-yielding ingredients listed under non-obvious names
    pub hidden_sugars: Vec<String>,
    /// Additives flagged as harmful regardless of quantity
    pub harmful_additives: Vec<String>,
    /// Keywords marking an ingredient as nutritionally good
    pub healthy_keywords: Vec<String>,
    /// Keywords identifying nutrition-fact lines in OCR output
    pub nutrition_keywords: Vec<String>,
    /// Keywords identifying marketing copy in OCR output
    pub marketing_keywords: Vec<String>,
    /// Indicators of slogan lines in OCR output ("!" plus emotive words)
    pub slogan_indicators: Vec<String>,
}

impl Default for ClassificationTables {
    fn default() -> Self {
        let to_vec = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            hidden_sugars: to_vec(&[
                "sugar",
                "maltodextrin",
                "dextrose",
                "fructose",
                "glucose",
                "sucrose",
                "corn syrup",
                "invert sugar",
                "cane juice",
                "molasses",
                "barley malt",
                "rice syrup",
                "agave",
                "honey",
                "caramel",
            ]),
            harmful_additives: to_vec(&[
                "aspartame",
                "monosodium glutamate",
                "msg",
                "sodium benzoate",
                "potassium sorbate",
                "bha",
                "bht",
                "tbhq",
                "tartrazine",
                "artificial colour",
                "artificial color",
                "artificial flavour",
                "artificial flavor",
                "high fructose corn syrup",
                "hydrogenated",
                "palm oil",
                "nitrite",
                "nitrate",
                "sulfite",
                "carrageenan",
            ]),
            healthy_keywords: to_vec(&[
                "whole grain",
                "whole wheat",
                "oat",
                "fiber",
                "fibre",
                "vitamin",
                "protein",
                "vegetable",
                "fruit",
                "almond",
                "walnut",
                "seed",
                "legume",
                "lentil",
                "quinoa",
                "olive oil",
                "brown rice",
            ]),
            nutrition_keywords: to_vec(&[
                "calories",
                "protein",
                "fat",
                "carbohydrate",
                "sugar",
                "sodium",
                "fiber",
                "vitamin",
                "calcium",
                "iron",
                "serving",
                "nutrition facts",
                "energy",
                "kcal",
                "kj",
                "saturated",
                "trans",
                "cholesterol",
            ]),
            marketing_keywords: to_vec(&[
                "new",
                "improved",
                "natural",
                "organic",
                "premium",
                "fresh",
                "healthy",
                "delicious",
                "tasty",
                "best",
                "quality",
                "authentic",
                "traditional",
                "homemade",
                "artisan",
                "gourmet",
                "special",
            ]),
            slogan_indicators: to_vec(&[
                "!",
                "taste",
                "experience",
                "enjoy",
                "love",
                "perfect",
                "ultimate",
            ]),
        }
    }
}

impl ClassificationTables {
    /// Validate the classification tables
    pub fn validate(&self) -> AppResult<()> {
        let validate_keywords = |keywords: &[String], category: &str| -> AppResult<()> {
            if keywords.is_empty() {
                return Err(AnalysisError::Config(format!(
                    "{} cannot be empty",
                    category
                )));
            }
            for (i, keyword) in keywords.iter().enumerate() {
                if keyword.trim().is_empty() {
                    return Err(AnalysisError::Config(format!(
                        "{}[{}] cannot be empty",
                        category, i
                    )));
                }
                if keyword.chars().any(|c| c.is_control()) {
                    return Err(AnalysisError::Config(format!(
                        "{}[{}] '{}' contains control characters",
                        category, i, keyword
                    )));
                }
            }
            Ok(())
        };

        validate_keywords(&self.hidden_sugars, "hidden_sugars")?;
        validate_keywords(&self.harmful_additives, "harmful_additives")?;
        validate_keywords(&self.healthy_keywords, "healthy_keywords")?;
        validate_keywords(&self.nutrition_keywords, "nutrition_keywords")?;
        validate_keywords(&self.marketing_keywords, "marketing_keywords")?;
        validate_keywords(&self.slogan_indicators, "slogan_indicators")?;

        Ok(())
    }
}

/// Load classification tables from a JSON config file
///
/// Resolution order: the `CLASSIFICATION_TABLES_PATH` environment variable,
/// then a set of fallback paths, then the compiled-in defaults. A file that
/// exists but fails to parse is logged and skipped rather than aborting
/// startup.
pub fn load_classification_tables() -> ClassificationTables {
    if let Ok(config_path) = std::env::var("CLASSIFICATION_TABLES_PATH") {
        info!(
            "Loading classification tables from environment variable: {}",
            config_path
        );
        match fs::read_to_string(&config_path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(tables) => {
                    info!(
                        "Successfully loaded classification tables from: {}",
                        config_path
                    );
                    return tables;
                }
                Err(e) => {
                    warn!(
                        "Failed to parse classification tables from '{}': {}. Falling back to default paths.",
                        config_path, e
                    );
                }
            },
            Err(e) => {
                warn!(
                    "Failed to read classification tables from '{}': {}. Falling back to default paths.",
                    config_path, e
                );
            }
        }
    }

    // Fallback to well-known paths
    let possible_paths = [
        "/app/config/classification_tables.json", // Docker path
        "config/classification_tables.json",      // Local development path
        "../config/classification_tables.json",   // Test path
    ];

    for config_path in &possible_paths {
        match fs::read_to_string(config_path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(tables) => {
                    info!(
                        "Successfully loaded classification tables from fallback path: {}",
                        config_path
                    );
                    return tables;
                }
                Err(e) => {
                    warn!(
                        "Failed to parse classification tables at '{}': {}. Trying next path.",
                        config_path, e
                    );
                    continue;
                }
            },
            Err(_) => continue, // Try next path
        }
    }

    warn!("No classification tables file found in any expected location. Using compiled-in defaults.");
    ClassificationTables::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tables_validate() {
        let tables = ClassificationTables::default();
        assert!(tables.validate().is_ok());
    }

    #[test]
    fn test_empty_vocabulary_rejected() {
        let mut tables = ClassificationTables::default();
        tables.hidden_sugars.clear();
        assert!(tables.validate().is_err());
    }

    #[test]
    fn test_control_characters_rejected() {
        let mut tables = ClassificationTables::default();
        tables.marketing_keywords.push("bad\u{0007}keyword".to_string());
        assert!(tables.validate().is_err());
    }
}
