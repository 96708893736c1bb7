//! # Personalized Recommendation Engine
//!
//! Maps a user's health conditions to targeted, nutrient-aware advice.
//!
//! The canonical user-input shape is the structured [`UserHealthProfile`];
//! it is lowered into normalized condition keywords before matching, so a
//! flat keyword list can also be fed to [`recommendations_for_keywords`]
//! directly.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::product::NormalizedProduct;

/// Structured user health profile
///
/// The canonical request shape. Boolean condition flags are lowered into
/// condition keywords; the allergy list feeds allergen screening.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserHealthProfile {
    pub age: u8,
    #[serde(rename = "hasDiabetes")]
    pub has_diabetes: bool,
    #[serde(rename = "hasHighBP")]
    pub has_high_bp: bool,
    #[serde(rename = "hasHeartDisease")]
    pub has_heart_disease: bool,
    #[serde(rename = "isPregnant")]
    pub is_pregnant: bool,
    #[serde(rename = "isChild")]
    pub is_child: bool,
    pub allergies: Vec<String>,
}

impl UserHealthProfile {
    /// Lower the boolean condition flags into normalized condition keywords
    pub fn condition_keywords(&self) -> Vec<String> {
        let mut keywords = Vec::new();
        if self.has_diabetes {
            keywords.push("diabetes".to_string());
        }
        if self.has_high_bp {
            keywords.push("high bp".to_string());
        }
        if self.has_heart_disease {
            keywords.push("heart disease".to_string());
        }
        keywords
    }
}

/// Saturated-fat threshold for heart-related advice
const HEART_FAT_THRESHOLD: f64 = 5.0;
/// Sugar threshold for diabetes-related advice
const DIABETES_SUGAR_THRESHOLD: f64 = 5.0;
/// Salt threshold for blood-pressure advice
const BP_SALT_THRESHOLD: f64 = 1.5;

/// Generate recommendations for a structured profile
pub fn recommendations_for_profile(
    product: &NormalizedProduct,
    profile: &UserHealthProfile,
) -> Vec<String> {
    recommendations_for_keywords(product, &profile.condition_keywords())
}

/// Generate recommendations for normalized condition keywords
///
/// Keywords are matched case-insensitively against the known condition
/// vocabulary: "diabetes"/"sugar" (sugar advice), "high bp"/"hypertension"
/// (salt advice), "heart disease" (saturated-fat advice). Each matched
/// category emits exactly one recommendation; unmatched keywords emit
/// nothing. Category order is fixed: sugar, blood pressure, heart.
pub fn recommendations_for_keywords(
    product: &NormalizedProduct,
    conditions: &[String],
) -> Vec<String> {
    let normalized: Vec<String> = conditions
        .iter()
        .map(|condition| condition.trim().to_lowercase())
        .collect();
    let matches_any =
        |keywords: &[&str]| normalized.iter().any(|c| keywords.contains(&c.as_str()));

    let mut recommendations = Vec::new();

    if matches_any(&["diabetes", "sugar"]) {
        if product.sugars_100g > DIABETES_SUGAR_THRESHOLD {
            recommendations.push(format!(
                "High sugar content ({:.1}g per 100g), not recommended with diabetes",
                product.sugars_100g
            ));
        } else {
            recommendations
                .push("Sugar content is within acceptable limits, consume in moderation".to_string());
        }
    }

    if matches_any(&["high bp", "hypertension"]) {
        if product.salt_100g > BP_SALT_THRESHOLD {
            recommendations.push(format!(
                "High salt content ({:.1}g per 100g), not recommended with high blood pressure",
                product.salt_100g
            ));
        } else {
            recommendations
                .push("Salt content is within acceptable limits, consume in moderation".to_string());
        }
    }

    if matches_any(&["heart disease"]) {
        if product.saturated_fat_100g > HEART_FAT_THRESHOLD {
            recommendations.push(format!(
                "High saturated fat ({:.1}g per 100g), not recommended with heart conditions",
                product.saturated_fat_100g
            ));
        } else {
            recommendations.push(
                "Saturated fat is within acceptable limits, consume in moderation".to_string(),
            );
        }
    }

    debug!(
        condition_count = conditions.len(),
        recommendation_count = recommendations.len(),
        "Generated personalized recommendations"
    );

    recommendations
}
