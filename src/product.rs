//! # Product Data Module
//!
//! Raw product records as returned by the barcode lookup collaborator and
//! the canonical nutrient/display view the pipeline computes over.
//!
//! The raw record mirrors the Open Food Facts product payload and may omit
//! any field; normalization fills deterministic defaults so the rest of
//! the pipeline never deals with absent data.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Raw, possibly-partial product record from the lookup collaborator
///
/// Immutable per request. Unknown nutriment keys are preserved in the map
/// but only the keys the pipeline reads are documented here
/// (`sugars_100g`, `salt_100g`, `saturated-fat_100g`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawProductRecord {
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub brands: Option<String>,
    #[serde(default)]
    pub ingredients_text: Option<String>,
    /// Processing-level classification, 1 (unprocessed) through 4
    /// (ultra-processed)
    #[serde(default)]
    pub nova_group: Option<u8>,
    /// Letter grade (a-e) for nutritional quality
    #[serde(default)]
    pub nutriscore_grade: Option<String>,
    /// Nutrient key to per-100g value mapping
    #[serde(default, deserialize_with = "numeric_nutriments")]
    pub nutriments: HashMap<String, f64>,
}

/// Keep only numeric nutriment entries
///
/// The product database mixes numeric values with unit strings in the
/// same map (`"sugars_100g": 3.5, "sugars_unit": "g"`); non-numeric
/// entries are dropped instead of failing the whole record.
fn numeric_nutriments<'de, D>(deserializer: D) -> Result<HashMap<String, f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: HashMap<String, serde_json::Value> = HashMap::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(key, value)| value.as_f64().map(|number| (key, number)))
        .collect())
}

/// Canonical per-100g nutrient view with display defaults applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedProduct {
    pub product_name: String,
    pub brand: String,
    pub ingredients_text: String,
    pub sugars_100g: f64,
    pub salt_100g: f64,
    pub saturated_fat_100g: f64,
    /// Clamped to 1..=4
    pub nova_group: u8,
    /// Upper-cased nutri-score letter, or "UNKNOWN"
    pub nutri_score: String,
}

impl NormalizedProduct {
    /// Map a raw record into the canonical view
    ///
    /// Missing nutrients default to 0, a missing nova group defaults to 1,
    /// and display fields fall back to "Unknown Product" / "Unknown Brand"
    /// / "UNKNOWN".
    pub fn from_raw(raw: &RawProductRecord) -> Self {
        let nutrient = |key: &str| raw.nutriments.get(key).copied().unwrap_or(0.0);

        let product_name = raw
            .product_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or("Unknown Product")
            .to_string();
        let brand = raw
            .brands
            .as_deref()
            .map(str::trim)
            .filter(|brand| !brand.is_empty())
            .unwrap_or("Unknown Brand")
            .to_string();
        let nutri_score = raw
            .nutriscore_grade
            .as_deref()
            .map(str::trim)
            .filter(|grade| !grade.is_empty())
            .map(str::to_uppercase)
            .unwrap_or_else(|| "UNKNOWN".to_string());

        let normalized = Self {
            product_name,
            brand,
            ingredients_text: raw.ingredients_text.clone().unwrap_or_default(),
            sugars_100g: nutrient("sugars_100g"),
            salt_100g: nutrient("salt_100g"),
            saturated_fat_100g: nutrient("saturated-fat_100g"),
            nova_group: raw.nova_group.unwrap_or(1).clamp(1, 4),
            nutri_score,
        };

        debug!(
            product_name = %normalized.product_name,
            sugars_100g = normalized.sugars_100g,
            salt_100g = normalized.salt_100g,
            nova_group = normalized.nova_group,
            "Normalized product record"
        );

        normalized
    }

    /// Human-readable processing-level label for the nova group
    pub fn processing_level(&self) -> &'static str {
        match self.nova_group {
            1 => "Unprocessed or minimally processed",
            2 => "Processed culinary ingredients",
            3 => "Processed foods",
            _ => "Ultra-processed foods",
        }
    }
}
