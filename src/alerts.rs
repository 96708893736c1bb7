//! # Risk & Alert Engine
//!
//! Deterministic threshold-based alerts over normalized nutrients and
//! classified ingredients, plus allergen screening against a user's
//! declared allergies.
//!
//! Rules are evaluated in fixed declaration order and each rule produces
//! zero or one alert, so alert order is stable across invocations.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ingredient::Ingredient;
use crate::product::NormalizedProduct;

/// Alert severity, restricted to a closed set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// A single health alert derived from the rule set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthAlert {
    /// Tag string identifying the rule that fired
    #[serde(rename = "type")]
    pub alert_type: String,
    pub message: String,
    pub severity: Severity,
}

impl HealthAlert {
    fn new(alert_type: &str, message: String, severity: Severity) -> Self {
        Self {
            alert_type: alert_type.to_string(),
            message,
            severity,
        }
    }
}

/// Sugar per 100g above which the high-sugar alert fires
const HIGH_SUGAR_THRESHOLD: f64 = 10.0;
/// Salt per 100g above which the high-salt alert fires
const HIGH_SALT_THRESHOLD: f64 = 1.5;

/// Evaluate the fixed alert rule set against a normalized product
///
/// Rules, in order:
///
/// 1. `sugars_100g > 10` raises "High Sugar" (high severity)
/// 2. `salt_100g > 1.5` raises "High Salt" (high severity)
/// 3. any harmful ingredient raises a single "Harmful Ingredients" alert
///    (medium severity) listing the first three harmful names
/// 4. `nova_group == 4` raises "Ultra-Processed" (medium severity)
///
/// The output may be empty. No randomness is involved.
pub fn evaluate_alerts(product: &NormalizedProduct, ingredients: &[Ingredient]) -> Vec<HealthAlert> {
    let mut alerts = Vec::new();

    if product.sugars_100g > HIGH_SUGAR_THRESHOLD {
        alerts.push(HealthAlert::new(
            "High Sugar",
            format!(
                "High sugar content: {:.1}g per 100g",
                product.sugars_100g
            ),
            Severity::High,
        ));
    }

    if product.salt_100g > HIGH_SALT_THRESHOLD {
        alerts.push(HealthAlert::new(
            "High Salt",
            format!("High salt content: {:.1}g per 100g", product.salt_100g),
            Severity::High,
        ));
    }

    let harmful_names: Vec<&str> = ingredients
        .iter()
        .filter(|ingredient| ingredient.harmful)
        .map(|ingredient| ingredient.name.as_str())
        .collect();
    if !harmful_names.is_empty() {
        let listed = harmful_names
            .iter()
            .take(3)
            .copied()
            .collect::<Vec<_>>()
            .join(", ");
        alerts.push(HealthAlert::new(
            "Harmful Ingredients",
            format!("Contains potentially harmful ingredients: {}", listed),
            Severity::Medium,
        ));
    }

    if product.nova_group == 4 {
        alerts.push(HealthAlert::new(
            "Ultra-Processed",
            "This is an ultra-processed food product".to_string(),
            Severity::Medium,
        ));
    }

    debug!(alert_count = alerts.len(), "Evaluated alert rules");
    alerts
}

/// Allergen keyword expansions for common declared allergies
///
/// A declared allergy not present here is matched literally against
/// ingredient names.
fn allergen_keywords(allergy: &str) -> Vec<&'static str> {
    match allergy {
        "nuts" => vec![
            "nut", "almond", "walnut", "peanut", "cashew", "pistachio", "hazelnut",
        ],
        "dairy" => vec!["milk", "cheese", "butter", "yogurt", "cream", "whey", "casein"],
        "gluten" => vec!["wheat", "barley", "rye", "gluten", "bread", "pasta"],
        "soy" => vec!["soy", "soya", "tofu", "soybean"],
        "eggs" => vec!["egg", "albumin", "mayonnaise"],
        _ => vec![],
    }
}

/// Screen ingredients against the user's declared allergies
///
/// Produces at most one high-severity alert per declared allergy, raised
/// on the first ingredient whose name contains any expansion keyword.
pub fn allergy_alerts(allergies: &[String], ingredients: &[Ingredient]) -> Vec<HealthAlert> {
    let mut alerts = Vec::new();

    for allergy in allergies {
        let allergy = allergy.trim().to_lowercase();
        if allergy.is_empty() {
            continue;
        }
        let expansions = allergen_keywords(&allergy);
        let keywords: Vec<&str> = if expansions.is_empty() {
            vec![allergy.as_str()]
        } else {
            expansions
        };

        let found = ingredients.iter().any(|ingredient| {
            keywords
                .iter()
                .any(|keyword| ingredient.name.contains(keyword))
        });
        if found {
            alerts.push(HealthAlert::new(
                "Allergen",
                format!(
                    "Contains {}: potential allergen detected, avoid this product",
                    allergy.to_uppercase()
                ),
                Severity::High,
            ));
        }
    }

    alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::RawProductRecord;
    use std::collections::HashMap;

    fn product_with(sugars: f64, salt: f64, nova: u8) -> NormalizedProduct {
        let mut nutriments = HashMap::new();
        nutriments.insert("sugars_100g".to_string(), sugars);
        nutriments.insert("salt_100g".to_string(), salt);
        NormalizedProduct::from_raw(&RawProductRecord {
            nova_group: Some(nova),
            nutriments,
            ..Default::default()
        })
    }

    fn harmful(name: &str) -> Ingredient {
        Ingredient {
            name: name.to_string(),
            percentage: None,
            harmful: true,
            category: crate::ingredient::IngredientCategory::Harmful,
        }
    }

    #[test]
    fn test_no_alerts_for_clean_product() {
        let alerts = evaluate_alerts(&product_with(1.0, 0.1, 1), &[]);
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_high_sugar_alert_embeds_value() {
        let alerts = evaluate_alerts(&product_with(15.0, 0.5, 1), &[]);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, "High Sugar");
        assert_eq!(alerts[0].severity, Severity::High);
        assert!(alerts[0].message.contains("15.0"));
    }

    #[test]
    fn test_harmful_ingredient_alert_lists_first_three() {
        let ingredients = vec![harmful("a"), harmful("b"), harmful("c"), harmful("d")];
        let alerts = evaluate_alerts(&product_with(0.0, 0.0, 1), &ingredients);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, "Harmful Ingredients");
        assert_eq!(alerts[0].severity, Severity::Medium);
        assert!(alerts[0].message.contains("a, b, c"));
        assert!(!alerts[0].message.contains('d'));
    }

    #[test]
    fn test_rule_order_is_stable() {
        let ingredients = vec![harmful("aspartame")];
        let alerts = evaluate_alerts(&product_with(20.0, 2.0, 4), &ingredients);
        let types: Vec<&str> = alerts.iter().map(|a| a.alert_type.as_str()).collect();
        assert_eq!(
            types,
            vec!["High Sugar", "High Salt", "Harmful Ingredients", "Ultra-Processed"]
        );
    }

    #[test]
    fn test_allergy_alert_uses_keyword_expansion() {
        let ingredients = vec![Ingredient {
            name: "skimmed milk powder".to_string(),
            percentage: None,
            harmful: false,
            category: crate::ingredient::IngredientCategory::Moderate,
        }];
        let alerts = allergy_alerts(&["dairy".to_string()], &ingredients);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, Severity::High);
        assert!(alerts[0].message.contains("DAIRY"));
    }

    #[test]
    fn test_one_alert_per_allergy_type() {
        let ingredients = vec![
            Ingredient {
                name: "almond".to_string(),
                percentage: None,
                harmful: false,
                category: crate::ingredient::IngredientCategory::Good,
            },
            Ingredient {
                name: "hazelnut paste".to_string(),
                percentage: None,
                harmful: false,
                category: crate::ingredient::IngredientCategory::Good,
            },
        ];
        let alerts = allergy_alerts(&["nuts".to_string()], &ingredients);
        assert_eq!(alerts.len(), 1);
    }

    #[test]
    fn test_undeclared_allergy_matched_literally() {
        let ingredients = vec![Ingredient {
            name: "mustard seed".to_string(),
            percentage: None,
            harmful: false,
            category: crate::ingredient::IngredientCategory::Good,
        }];
        let alerts = allergy_alerts(&["mustard".to_string()], &ingredients);
        assert_eq!(alerts.len(), 1);
    }
}
