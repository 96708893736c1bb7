//! # Label Analysis Pipeline
//!
//! Orchestrates the full assessment: normalize the product record, parse
//! and classify ingredients, evaluate alert rules, compute the health
//! score and generate personalized recommendations.
//!
//! The core is purely functional over its inputs; the only shared state
//! is the read-only classification tables. The barcode and image entry
//! points sit at the collaborator boundary and feed the same pure core,
//! so identical inputs always produce identical results.

use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::info;

use crate::alerts::{allergy_alerts, evaluate_alerts, HealthAlert};
use crate::classification::ClassificationTables;
use crate::errors::{AnalysisError, AppResult};
use crate::ingredient::{Ingredient, IngredientParser};
use crate::lookup::ProductLookup;
use crate::ocr::OcrEngine;
use crate::ocr_text::{extract_ingredient_list, CategorizedText, TextCategorizer};
use crate::product::{NormalizedProduct, RawProductRecord};
use crate::recommendations::{recommendations_for_profile, UserHealthProfile};
use crate::score::health_score;

/// Terminal, immutable result of one label analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub product_name: String,
    pub brand: String,
    /// Integer health score in [0, 100]
    pub health_score: u8,
    pub ingredients: Vec<Ingredient>,
    pub alerts: Vec<HealthAlert>,
    pub nutri_score: String,
    pub processing_level: String,
    pub personalized_recommendations: Vec<String>,
}

/// Result of the image path: OCR categorization plus the assessment over
/// the extracted ingredient list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub categorized_text: CategorizedText,
    pub extracted_ingredients: Vec<String>,
    pub analysis: AnalysisReport,
}

/// The label analysis pipeline
///
/// Holds the shared classification tables and the components built over
/// them. Immutable after construction and safe to share across
/// concurrently executing requests without locking.
pub struct LabelAnalyzer {
    parser: IngredientParser,
    categorizer: TextCategorizer,
}

impl LabelAnalyzer {
    pub fn new(tables: Arc<ClassificationTables>) -> Self {
        Self {
            parser: IngredientParser::new(Arc::clone(&tables)),
            categorizer: TextCategorizer::new(tables),
        }
    }

    /// Analyze a raw product record against a user profile
    ///
    /// Pure and synchronous; never fails for syntactically valid input.
    pub fn analyze_product(
        &self,
        raw: &RawProductRecord,
        profile: &UserHealthProfile,
    ) -> AnalysisReport {
        let product = NormalizedProduct::from_raw(raw);
        let ingredients = self.parser.parse(&product.ingredients_text);

        let mut alerts = evaluate_alerts(&product, &ingredients);
        alerts.extend(allergy_alerts(&profile.allergies, &ingredients));

        let harmful_count = ingredients.iter().filter(|i| i.harmful).count();
        let score = health_score(&product, harmful_count);
        let recommendations = recommendations_for_profile(&product, profile);

        self.assemble(product, ingredients, alerts, score, recommendations)
    }

    /// Analyze a product record, trapping unexpected panics
    ///
    /// The pipeline is designed to be total, so this path should be
    /// unreachable; a panic is still reported as an internal error
    /// instead of tearing down the request task.
    pub fn analyze_product_guarded(
        &self,
        raw: &RawProductRecord,
        profile: &UserHealthProfile,
    ) -> AppResult<AnalysisReport> {
        catch_unwind(AssertUnwindSafe(|| self.analyze_product(raw, profile))).map_err(|_| {
            AnalysisError::Internal("Unexpected failure inside the analysis pipeline".to_string())
        })
    }

    /// Barcode entry point: fetch the product record, then run the pure core
    pub async fn analyze_barcode(
        &self,
        lookup: &dyn ProductLookup,
        barcode: &str,
        profile: &UserHealthProfile,
    ) -> AppResult<AnalysisReport> {
        let start_time = std::time::Instant::now();
        let raw = lookup.fetch(barcode).await?;
        let report = self.analyze_product_guarded(&raw, profile)?;

        metrics::counter!("analyses_total", "path" => "barcode").increment(1);
        metrics::histogram!("analysis_duration_seconds")
            .record(start_time.elapsed().as_secs_f64());
        info!(
            barcode = %barcode,
            health_score = report.health_score,
            alert_count = report.alerts.len(),
            "Completed barcode analysis"
        );
        Ok(report)
    }

    /// Image entry point: OCR, categorize, extract ingredients, then run
    /// the pure core over a synthetic record
    pub async fn analyze_image(
        &self,
        engine: &dyn OcrEngine,
        image_bytes: &[u8],
        profile: &UserHealthProfile,
    ) -> AppResult<ScanReport> {
        let start_time = std::time::Instant::now();
        let lines = engine.recognize(image_bytes).await?;

        let categorized = self.categorizer.categorize(&lines);
        let extracted = extract_ingredient_list(&lines);

        let raw = RawProductRecord {
            brands: categorized.brand_name.clone(),
            ingredients_text: if extracted.is_empty() {
                None
            } else {
                Some(extracted.join(", "))
            },
            ..Default::default()
        };
        let analysis = self.analyze_product_guarded(&raw, profile)?;

        metrics::counter!("analyses_total", "path" => "image").increment(1);
        metrics::histogram!("analysis_duration_seconds")
            .record(start_time.elapsed().as_secs_f64());
        info!(
            line_count = lines.len(),
            extracted_ingredients = extracted.len(),
            health_score = analysis.health_score,
            "Completed label scan analysis"
        );

        Ok(ScanReport {
            categorized_text: categorized,
            extracted_ingredients: extracted,
            analysis,
        })
    }

    fn assemble(
        &self,
        product: NormalizedProduct,
        ingredients: Vec<Ingredient>,
        alerts: Vec<HealthAlert>,
        score: u8,
        recommendations: Vec<String>,
    ) -> AnalysisReport {
        AnalysisReport {
            processing_level: product.processing_level().to_string(),
            product_name: product.product_name,
            brand: product.brand,
            health_score: score,
            ingredients,
            alerts,
            nutri_score: product.nutri_score,
            personalized_recommendations: recommendations,
        }
    }
}
