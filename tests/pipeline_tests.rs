#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use label_insight::classification::ClassificationTables;
    use label_insight::errors::{AnalysisError, AppResult};
    use label_insight::lookup::ProductLookup;
    use label_insight::ocr::OcrEngine;
    use label_insight::ocr_text::OcrLine;
    use label_insight::pipeline::LabelAnalyzer;
    use label_insight::product::RawProductRecord;
    use label_insight::recommendations::UserHealthProfile;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn create_analyzer() -> LabelAnalyzer {
        LabelAnalyzer::new(Arc::new(ClassificationTables::default()))
    }

    fn record_with_nutrients(sugars: f64, salt: f64, fat: f64, nova: u8) -> RawProductRecord {
        let mut nutriments = HashMap::new();
        nutriments.insert("sugars_100g".to_string(), sugars);
        nutriments.insert("salt_100g".to_string(), salt);
        nutriments.insert("saturated-fat_100g".to_string(), fat);
        RawProductRecord {
            product_name: Some("Test Cereal".to_string()),
            brands: Some("Test Brand".to_string()),
            nova_group: Some(nova),
            nutriments,
            ..Default::default()
        }
    }

    /// Lookup collaborator returning a fixed record
    struct StaticLookup {
        record: RawProductRecord,
    }

    #[async_trait]
    impl ProductLookup for StaticLookup {
        async fn fetch(&self, _barcode: &str) -> AppResult<RawProductRecord> {
            Ok(self.record.clone())
        }
    }

    /// Lookup collaborator that never finds a product
    struct MissingLookup;

    #[async_trait]
    impl ProductLookup for MissingLookup {
        async fn fetch(&self, barcode: &str) -> AppResult<RawProductRecord> {
            Err(AnalysisError::NotFound(format!(
                "No product found for barcode {}",
                barcode
            )))
        }
    }

    /// OCR collaborator returning preset lines
    struct StaticOcr {
        lines: Vec<OcrLine>,
    }

    #[async_trait]
    impl OcrEngine for StaticOcr {
        async fn recognize(&self, _image_bytes: &[u8]) -> AppResult<Vec<OcrLine>> {
            Ok(self.lines.clone())
        }
    }

    fn line(text: &str, confidence: f32) -> OcrLine {
        OcrLine {
            text: text.to_string(),
            confidence,
            bbox: [[0.0, 0.0], [100.0, 0.0], [100.0, 20.0], [0.0, 20.0]],
        }
    }

    #[test]
    fn test_high_sugar_product_analysis() {
        let analyzer = create_analyzer();
        let raw = record_with_nutrients(15.0, 0.5, 1.0, 1);
        let report = analyzer.analyze_product(&raw, &UserHealthProfile::default());

        // Only the sugar rule fires
        assert_eq!(report.alerts.len(), 1);
        assert_eq!(report.alerts[0].alert_type, "High Sugar");

        // Deductions: 15/20*25 + 0.5/3*20 + 1/10*20 = 24.08 -> 76
        assert_eq!(report.health_score, 76);
        assert_eq!(report.product_name, "Test Cereal");
        assert_eq!(report.brand, "Test Brand");
        assert_eq!(
            report.processing_level,
            "Unprocessed or minimally processed"
        );
    }

    #[test]
    fn test_sugar_only_deduction_rounds_to_81() {
        let analyzer = create_analyzer();
        let raw = record_with_nutrients(15.0, 0.0, 0.0, 1);
        let report = analyzer.analyze_product(&raw, &UserHealthProfile::default());

        // 15/20*25 = 18.75 -> round(100 - 18.75) = 81
        assert_eq!(report.health_score, 81);
    }

    #[test]
    fn test_score_always_in_range() {
        let analyzer = create_analyzer();
        let profile = UserHealthProfile::default();

        let extreme = record_with_nutrients(500.0, 50.0, 80.0, 4);
        let report = analyzer.analyze_product(&extreme, &profile);
        assert!(report.health_score <= 100);

        let empty = RawProductRecord::default();
        let report = analyzer.analyze_product(&empty, &profile);
        assert_eq!(report.health_score, 100);
    }

    #[test]
    fn test_identical_inputs_produce_identical_reports() {
        let analyzer = create_analyzer();
        let mut raw = record_with_nutrients(12.0, 2.0, 6.0, 4);
        raw.ingredients_text =
            Some("sugar, palm oil, whole grain oats, salt, aspartame".to_string());
        let profile = UserHealthProfile {
            has_diabetes: true,
            has_high_bp: true,
            has_heart_disease: true,
            allergies: vec!["nuts".to_string()],
            ..Default::default()
        };

        let first = analyzer.analyze_product(&raw, &profile);
        let second = analyzer.analyze_product(&raw, &profile);
        assert_eq!(first, second);
    }

    #[test]
    fn test_personalized_recommendations_flow_through() {
        let analyzer = create_analyzer();
        let raw = record_with_nutrients(8.0, 2.0, 6.0, 1);
        let profile = UserHealthProfile {
            has_diabetes: true,
            has_high_bp: true,
            has_heart_disease: true,
            ..Default::default()
        };

        let report = analyzer.analyze_product(&raw, &profile);
        assert_eq!(report.personalized_recommendations.len(), 3);
        assert!(report.personalized_recommendations[0].contains("8.0"));
    }

    #[test]
    fn test_allergy_alert_appended_after_rule_alerts() {
        let analyzer = create_analyzer();
        let mut raw = record_with_nutrients(15.0, 0.0, 0.0, 1);
        raw.ingredients_text = Some("wheat flour, milk solids".to_string());
        let profile = UserHealthProfile {
            allergies: vec!["dairy".to_string()],
            ..Default::default()
        };

        let report = analyzer.analyze_product(&raw, &profile);
        let types: Vec<&str> = report
            .alerts
            .iter()
            .map(|a| a.alert_type.as_str())
            .collect();
        assert_eq!(types, vec!["High Sugar", "Allergen"]);
    }

    #[tokio::test]
    async fn test_barcode_path_with_static_lookup() {
        let analyzer = create_analyzer();
        let lookup = StaticLookup {
            record: record_with_nutrients(15.0, 0.5, 1.0, 1),
        };

        let report = analyzer
            .analyze_barcode(&lookup, "737628064502", &UserHealthProfile::default())
            .await
            .unwrap();
        assert_eq!(report.alerts.len(), 1);
        assert_eq!(report.alerts[0].alert_type, "High Sugar");
    }

    #[tokio::test]
    async fn test_missing_product_surfaces_not_found() {
        let analyzer = create_analyzer();

        let result = analyzer
            .analyze_barcode(&MissingLookup, "000000000000", &UserHealthProfile::default())
            .await;
        assert!(matches!(result, Err(AnalysisError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_image_path_end_to_end() {
        let analyzer = create_analyzer();
        let engine = StaticOcr {
            lines: vec![
                line("FIZZY COLA", 0.97),
                line("Taste the sparkle!", 0.92),
                line("Energy: 180 kcal", 0.94),
                line("Ingredients: water, sugar, caramel, salt.", 0.91),
            ],
        };

        let report = analyzer
            .analyze_image(&engine, b"fake image bytes", &UserHealthProfile::default())
            .await
            .unwrap();

        assert_eq!(
            report.categorized_text.brand_name.as_deref(),
            Some("FIZZY COLA")
        );
        assert_eq!(
            report.categorized_text.slogans,
            vec!["Taste the sparkle!".to_string()]
        );
        assert_eq!(
            report
                .categorized_text
                .nutrition_facts
                .get("energy")
                .map(String::as_str),
            Some("180 kcal")
        );

        assert_eq!(
            report.extracted_ingredients,
            vec![
                "Water".to_string(),
                "Sugar".to_string(),
                "Caramel".to_string(),
                "Salt".to_string(),
            ]
        );

        // Extracted ingredients feed the same parser: sugar and caramel are
        // hidden sugars, so the harmful-ingredient rule fires
        assert_eq!(report.analysis.brand, "FIZZY COLA");
        let types: Vec<&str> = report
            .analysis
            .alerts
            .iter()
            .map(|a| a.alert_type.as_str())
            .collect();
        assert_eq!(types, vec!["Harmful Ingredients"]);
        // Two harmful ingredients deduct 6 points
        assert_eq!(report.analysis.health_score, 94);
    }

    #[tokio::test]
    async fn test_image_path_without_ingredient_anchor() {
        let analyzer = create_analyzer();
        let engine = StaticOcr {
            lines: vec![line("just a plain label", 0.9)],
        };

        let report = analyzer
            .analyze_image(&engine, b"fake image bytes", &UserHealthProfile::default())
            .await
            .unwrap();

        assert!(report.extracted_ingredients.is_empty());
        assert!(report.analysis.ingredients.is_empty());
        assert_eq!(report.analysis.health_score, 100);
        assert_eq!(report.analysis.product_name, "Unknown Product");
    }
}
