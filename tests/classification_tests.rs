#[cfg(test)]
mod tests {
    use label_insight::classification::{load_classification_tables, ClassificationTables};
    use std::io::Write;

    #[test]
    fn test_load_custom_tables_from_env_path() {
        let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        let custom = serde_json::json!({
            "hidden_sugars": ["testose"],
            "harmful_additives": ["testamate"],
            "healthy_keywords": ["testgrain"],
            "nutrition_keywords": ["testcalories"],
            "marketing_keywords": ["testfresh"],
            "slogan_indicators": ["!"]
        });
        file.write_all(custom.to_string().as_bytes())
            .expect("Failed to write temp file");

        std::env::set_var("CLASSIFICATION_TABLES_PATH", file.path());
        let tables = load_classification_tables();
        std::env::remove_var("CLASSIFICATION_TABLES_PATH");

        assert_eq!(tables.hidden_sugars, vec!["testose".to_string()]);
        assert_eq!(tables.marketing_keywords, vec!["testfresh".to_string()]);
        assert!(tables.validate().is_ok());
    }

    #[test]
    fn test_shipped_tables_file_matches_schema() {
        let content = std::fs::read_to_string("config/classification_tables.json")
            .expect("Shipped classification tables should exist");
        let tables: ClassificationTables =
            serde_json::from_str(&content).expect("Shipped classification tables should parse");
        assert!(tables.validate().is_ok());
        assert!(tables
            .hidden_sugars
            .iter()
            .any(|sugar| sugar == "maltodextrin"));
    }
}
