//! # Health Score Module
//!
//! Weighted-deduction health score over normalized nutrients, harmful
//! ingredient count and processing level. Pure and deterministic.

use tracing::debug;

use crate::product::NormalizedProduct;

/// Compute the 0-100 health score for a normalized product
///
/// Starts at 100 and subtracts five independently capped deductions:
///
/// - sugar: `min(25, sugars_100g / 20 * 25)`
/// - salt: `min(20, salt_100g / 3 * 20)`
/// - saturated fat: `min(20, saturated_fat_100g / 10 * 20)`
/// - harmful ingredients: `min(15, harmful_count * 3)`
/// - processing level: `min(20, (nova_group - 1) * 7)`
///
/// The sum is subtracted from 100, rounded to the nearest integer and
/// clamped to [0, 100]. The result is monotonically non-increasing in
/// every input.
pub fn health_score(product: &NormalizedProduct, harmful_count: usize) -> u8 {
    let sugar_deduction = (product.sugars_100g / 20.0 * 25.0).min(25.0);
    let salt_deduction = (product.salt_100g / 3.0 * 20.0).min(20.0);
    let fat_deduction = (product.saturated_fat_100g / 10.0 * 20.0).min(20.0);
    let harmful_deduction = (harmful_count as f64 * 3.0).min(15.0);
    let processing_deduction = (f64::from(product.nova_group.saturating_sub(1)) * 7.0).min(20.0);

    let total = sugar_deduction
        + salt_deduction
        + fat_deduction
        + harmful_deduction
        + processing_deduction;

    let score = (100.0 - total).round().clamp(0.0, 100.0) as u8;

    debug!(
        sugar_deduction,
        salt_deduction,
        fat_deduction,
        harmful_deduction,
        processing_deduction,
        score,
        "Computed health score"
    );

    score
}
