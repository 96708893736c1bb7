//! # Ingredient Parsing Module
//!
//! This module splits raw ingredient label text into classified
//! [`Ingredient`] entries.
//!
//! ## Features
//!
//! - Splitting on commas and sub-ingredient-opening parentheses
//! - Embedded percentage extraction (e.g. "wheat flour 60%")
//! - Table-driven classification: hidden sugars, harmful additives,
//!   healthy keywords
//!
//! Parsing is total over any string input. Empty or absent text yields an
//! empty list, never an error.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, trace};

use crate::classification::ClassificationTables;

// Percentage embedded in an ingredient candidate, e.g. "60%" or "12.5 %".
lazy_static! {
    static ref PERCENTAGE_REGEX: Regex =
        Regex::new(r"(\d+(?:\.\d+)?)\s*%").expect("Percentage pattern should be valid");
}

/// Classification category assigned to every parsed ingredient
///
/// Assignment is total: every ingredient gets exactly one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngredientCategory {
    Good,
    Moderate,
    Harmful,
}

/// A single classified ingredient extracted from label text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    /// Trimmed, lower-cased ingredient name with any percentage removed
    pub name: String,
    /// Embedded percentage when present and within [0, 100]
    pub percentage: Option<f32>,
    /// Whether the ingredient was classified as harmful
    pub harmful: bool,
    /// Classification category
    pub category: IngredientCategory,
}

/// Table-driven ingredient parser
///
/// Holds a shared reference to the process-wide classification tables.
/// The parser itself is immutable and safe to share across threads.
pub struct IngredientParser {
    tables: Arc<ClassificationTables>,
}

impl IngredientParser {
    /// Create a parser over the given classification tables
    pub fn new(tables: Arc<ClassificationTables>) -> Self {
        Self { tables }
    }

    /// Parse raw ingredient text into classified ingredients
    ///
    /// Splits on commas and on sub-ingredient-opening parentheses, trims
    /// and lower-cases each candidate, skips empty candidates, extracts an
    /// embedded percentage, and classifies the remaining text by substring
    /// containment with first-table-wins precedence: hidden-sugar and
    /// harmful-additive names map to `Harmful`, healthy keywords to
    /// `Good`, and everything else to `Moderate`.
    ///
    /// Only the first percentage match is stripped from a candidate; a
    /// candidate carrying several percentage patterns keeps the later ones
    /// in its name. This is a known limitation of the source data, not
    /// auto-corrected here.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use label_insight::classification::ClassificationTables;
    /// use label_insight::ingredient::{IngredientCategory, IngredientParser};
    ///
    /// let parser = IngredientParser::new(Arc::new(ClassificationTables::default()));
    /// let ingredients = parser.parse("Sugar, Whole Grain Oats, Salt");
    ///
    /// assert_eq!(ingredients.len(), 3);
    /// assert_eq!(ingredients[0].name, "sugar");
    /// assert_eq!(ingredients[0].category, IngredientCategory::Harmful);
    /// assert_eq!(ingredients[1].category, IngredientCategory::Good);
    /// assert_eq!(ingredients[2].category, IngredientCategory::Moderate);
    /// ```
    pub fn parse(&self, text: &str) -> Vec<Ingredient> {
        let mut ingredients = Vec::new();

        if text.trim().is_empty() {
            debug!("Empty ingredient text, returning no ingredients");
            return ingredients;
        }

        debug!(
            "Parsing ingredient text with {} characters",
            text.len()
        );

        for candidate in text.split([',', '(']) {
            let candidate = candidate
                .trim()
                .trim_end_matches([')', '.'])
                .trim()
                .to_lowercase();
            if candidate.is_empty() {
                continue;
            }

            let (name, percentage) = extract_percentage(&candidate);
            if name.is_empty() {
                continue;
            }

            let category = self.classify(&name);
            trace!("Classified ingredient '{}' as {:?}", name, category);

            ingredients.push(Ingredient {
                harmful: category == IngredientCategory::Harmful,
                name,
                percentage,
                category,
            });
        }

        debug!("Parsed {} ingredients", ingredients.len());
        ingredients
    }

    /// Classify a normalized ingredient name by substring containment
    ///
    /// Precedence: hidden-sugar, then harmful-additive, then healthy
    /// keyword; anything unmatched is `Moderate`.
    fn classify(&self, name: &str) -> IngredientCategory {
        if self
            .tables
            .hidden_sugars
            .iter()
            .any(|sugar| name.contains(sugar.as_str()))
        {
            return IngredientCategory::Harmful;
        }
        if self
            .tables
            .harmful_additives
            .iter()
            .any(|additive| name.contains(additive.as_str()))
        {
            return IngredientCategory::Harmful;
        }
        if self
            .tables
            .healthy_keywords
            .iter()
            .any(|keyword| name.contains(keyword.as_str()))
        {
            return IngredientCategory::Good;
        }
        IngredientCategory::Moderate
    }
}

/// Extract the first embedded percentage from an ingredient candidate
///
/// Returns the candidate with the matched substring removed and the parsed
/// value. Values outside [0, 100] are discarded and the percentage stays
/// absent, but the matched text is still stripped from the name.
fn extract_percentage(candidate: &str) -> (String, Option<f32>) {
    match PERCENTAGE_REGEX.captures(candidate) {
        Some(capture) => {
            let full_match = capture
                .get(0)
                .expect("Full match should always be available in regex capture");
            let value: Option<f32> = capture
                .get(1)
                .and_then(|m| m.as_str().parse().ok())
                .filter(|v| (0.0..=100.0).contains(v));

            let mut name = String::with_capacity(candidate.len());
            name.push_str(&candidate[..full_match.start()]);
            name.push_str(&candidate[full_match.end()..]);
            (name.trim().to_string(), value)
        }
        None => (candidate.trim().to_string(), None),
    }
}
