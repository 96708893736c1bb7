//! # OCR Text Categorization Module
//!
//! This module classifies raw OCR lines from a label photo into brand,
//! slogan, marketing, nutrition-fact and miscellaneous buckets, and
//! extracts an ingredient list from OCR free text.
//!
//! ## Features
//!
//! - Brand-name detection from upper-case, high-confidence lines
//! - Keyword-driven bucketing with fixed first-match precedence
//! - Nutrition key/value pair extraction from `:`- or `-`-separated lines
//! - Ingredient list extraction anchored on "ingredient(s)" in free text

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::classification::ClassificationTables;

lazy_static! {
    // "ingredients" anchor followed by a separator, e.g. "ingredients: wheat"
    static ref INGREDIENT_ANCHOR_REGEX: Regex =
        Regex::new(r"\bingredients?\b\s*[:;\-]?\s*").expect("Anchor pattern should be valid");
    static ref PERCENTAGE_REGEX: Regex =
        Regex::new(r"\d+(?:\.\d+)?\s*%").expect("Percentage pattern should be valid");
}

/// A single recognized text line from the OCR collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrLine {
    pub text: String,
    /// Recognition confidence in [0, 1]
    pub confidence: f32,
    /// 4-point bounding polygon, clockwise from top-left
    #[serde(rename = "box")]
    pub bbox: [[f32; 2]; 4],
}

/// Buckets produced by categorizing a label's OCR lines
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategorizedText {
    pub brand_name: Option<String>,
    pub slogans: Vec<String>,
    pub marketing_text: Vec<String>,
    pub nutrition_facts: BTreeMap<String, String>,
    pub miscellaneous: Vec<String>,
}

/// Classifies OCR lines using the shared keyword vocabularies
pub struct TextCategorizer {
    tables: Arc<ClassificationTables>,
}

impl TextCategorizer {
    pub fn new(tables: Arc<ClassificationTables>) -> Self {
        Self { tables }
    }

    /// Categorize OCR lines into brand/slogan/marketing/nutrition/misc
    ///
    /// Lines whose trimmed text has length <= 1 are discarded entirely.
    /// The first line in scan order that looks like a brand (fully
    /// upper-case, length strictly between 2 and 30, confidence above 0.9,
    /// and not a nutrition line) becomes `brand_name` and is removed from
    /// whatever bucket it would otherwise occupy. Every other surviving
    /// line is classified by first-match precedence: nutrition keyword,
    /// marketing keyword, slogan indicator, miscellaneous.
    pub fn categorize(&self, lines: &[OcrLine]) -> CategorizedText {
        let mut result = CategorizedText::default();

        for line in lines {
            let text = line.text.trim();
            if text.chars().count() <= 1 {
                trace!("Discarding near-empty OCR line");
                continue;
            }

            let lowered = text.to_lowercase();

            if result.brand_name.is_none() && self.is_brand_candidate(text, &lowered, line.confidence)
            {
                debug!(brand = %text, confidence = line.confidence, "Detected brand name");
                result.brand_name = Some(text.to_string());
                continue;
            }

            if self.contains_any(&lowered, &self.tables.nutrition_keywords) {
                if let Some((key, value)) = split_nutrition_pair(text) {
                    trace!(key = %key, "Recorded nutrition fact");
                    result.nutrition_facts.insert(key, value);
                    continue;
                }
                // No key/value shape: fall through to miscellaneous
                result.miscellaneous.push(text.to_string());
                continue;
            }

            if self.contains_any(&lowered, &self.tables.marketing_keywords) {
                result.marketing_text.push(text.to_string());
                continue;
            }

            if self.contains_any(&lowered, &self.tables.slogan_indicators) {
                result.slogans.push(text.to_string());
                continue;
            }

            result.miscellaneous.push(text.to_string());
        }

        debug!(
            brand = ?result.brand_name,
            slogans = result.slogans.len(),
            marketing = result.marketing_text.len(),
            nutrition_facts = result.nutrition_facts.len(),
            miscellaneous = result.miscellaneous.len(),
            "Categorized OCR lines"
        );

        result
    }

    /// Brand candidacy check
    ///
    /// Nutrition lines are excluded so an upper-case "ENERGY" header stays
    /// available for nutrition-fact handling instead of being consumed as
    /// a brand.
    fn is_brand_candidate(&self, text: &str, lowered: &str, confidence: f32) -> bool {
        let len = text.chars().count();
        if !(3..30).contains(&len) || confidence <= 0.9 {
            return false;
        }
        let mut has_alphabetic = false;
        for c in text.chars() {
            if c.is_alphabetic() {
                has_alphabetic = true;
                if !c.is_uppercase() {
                    return false;
                }
            }
        }
        has_alphabetic && !self.contains_any(lowered, &self.tables.nutrition_keywords)
    }

    fn contains_any(&self, lowered: &str, keywords: &[String]) -> bool {
        keywords.iter().any(|keyword| lowered.contains(keyword.as_str()))
    }
}

/// Split a nutrition line into a key/value pair on the first `:` or `-`
///
/// Returns `None` unless the split yields exactly two non-empty parts.
fn split_nutrition_pair(text: &str) -> Option<(String, String)> {
    let split_at = text.find([':', '-'])?;
    let key = text[..split_at].trim();
    let value = text[split_at + 1..].trim();
    if key.is_empty() || value.is_empty() {
        return None;
    }
    Some((key.to_lowercase(), value.to_string()))
}

/// Extract an ingredient list from OCR free text
///
/// Scans the lower-cased concatenation of all lines for the first
/// "ingredient(s)" anchor, captures text up to the next sentence
/// terminator, splits the capture on commas/semicolons/parentheses,
/// strips embedded percentage patterns, discards tokens of length <= 1
/// and capitalizes the remainder, preserving order. Returns an empty list
/// when no anchor is found.
pub fn extract_ingredient_list(lines: &[OcrLine]) -> Vec<String> {
    let full_text = lines
        .iter()
        .map(|line| line.text.trim())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    let anchor = match INGREDIENT_ANCHOR_REGEX.find(&full_text) {
        Some(anchor) => anchor,
        None => {
            debug!("No ingredient anchor found in OCR text");
            return Vec::new();
        }
    };

    let after_anchor = &full_text[anchor.end()..];
    let capture = match after_anchor.find('.') {
        Some(end) => &after_anchor[..end],
        None => after_anchor,
    };

    let ingredients: Vec<String> = capture
        .split([',', ';', '(', ')'])
        .map(|token| PERCENTAGE_REGEX.replace_all(token, "").trim().to_string())
        .filter(|token| token.chars().count() > 1)
        .map(|token| capitalize(&token))
        .collect();

    debug!(
        ingredient_count = ingredients.len(),
        "Extracted ingredient list from OCR text"
    );
    ingredients
}

/// Upper-case the first character of a token
fn capitalize(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
