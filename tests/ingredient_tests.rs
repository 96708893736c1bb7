#[cfg(test)]
mod tests {
    use label_insight::classification::ClassificationTables;
    use label_insight::ingredient::{IngredientCategory, IngredientParser};
    use std::sync::Arc;

    fn create_parser() -> IngredientParser {
        IngredientParser::new(Arc::new(ClassificationTables::default()))
    }

    #[test]
    fn test_basic_ingredient_classification() {
        let parser = create_parser();
        let ingredients = parser.parse("Sugar, Whole Grain Oats, Salt");

        assert_eq!(ingredients.len(), 3);

        assert_eq!(ingredients[0].name, "sugar");
        assert_eq!(ingredients[0].category, IngredientCategory::Harmful);
        assert!(ingredients[0].harmful);

        assert_eq!(ingredients[1].name, "whole grain oats");
        assert_eq!(ingredients[1].category, IngredientCategory::Good);
        assert!(!ingredients[1].harmful);

        assert_eq!(ingredients[2].name, "salt");
        assert_eq!(ingredients[2].category, IngredientCategory::Moderate);
        assert!(!ingredients[2].harmful);
    }

    #[test]
    fn test_every_ingredient_gets_exactly_one_category() {
        let parser = create_parser();
        let texts = [
            "water, sugar, maltodextrin, oats",
            "chocolate (cocoa mass 45%, cocoa butter), emulsifier (soy lecithin)",
            "salt,,  , pepper",
            "a, b, c, d, e, f, g",
        ];

        for text in texts {
            for ingredient in parser.parse(text) {
                // Closed enum: matching must cover every ingredient
                match ingredient.category {
                    IngredientCategory::Good
                    | IngredientCategory::Moderate
                    | IngredientCategory::Harmful => {}
                }
                assert!(!ingredient.name.is_empty());
                assert_eq!(ingredient.name, ingredient.name.to_lowercase());
            }
        }
    }

    #[test]
    fn test_percentages_always_in_range() {
        let parser = create_parser();
        let ingredients = parser.parse("wheat flour 60%, cocoa 12.5%, syrup 250%, salt");

        for ingredient in &ingredients {
            if let Some(pct) = ingredient.percentage {
                assert!((0.0..=100.0).contains(&pct));
            }
        }

        assert_eq!(ingredients[0].percentage, Some(60.0));
        assert_eq!(ingredients[1].percentage, Some(12.5));
        // Out-of-range value is discarded, ingredient kept
        assert_eq!(ingredients[2].percentage, None);
        assert_eq!(ingredients[2].name, "syrup");
    }

    #[test]
    fn test_percentage_removed_from_name() {
        let parser = create_parser();
        let ingredients = parser.parse("tomato paste 28%");
        assert_eq!(ingredients[0].name, "tomato paste");
        assert_eq!(ingredients[0].percentage, Some(28.0));
    }

    #[test]
    fn test_order_mirrors_source_order() {
        let parser = create_parser();
        let ingredients = parser.parse("water, sugar, salt, yeast");
        let names: Vec<&str> = ingredients.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["water", "sugar", "salt", "yeast"]);
    }

    #[test]
    fn test_totality_over_awkward_inputs() {
        let parser = create_parser();

        assert!(parser.parse("").is_empty());
        assert!(parser.parse("   \t ").is_empty());
        assert!(parser.parse(",,,,").is_empty());
        assert!(parser.parse("((((").is_empty());

        // Lone percentage collapses to nothing after stripping
        assert!(parser.parse("50%").is_empty());

        // Unicode content passes through untouched
        let ingredients = parser.parse("café, mañana");
        assert_eq!(ingredients.len(), 2);
        assert_eq!(ingredients[0].name, "café");
    }

    #[test]
    fn test_custom_tables_are_injectable() {
        let mut tables = ClassificationTables::default();
        tables.healthy_keywords.push("unobtainium".to_string());
        let parser = IngredientParser::new(Arc::new(tables));

        let ingredients = parser.parse("unobtainium extract");
        assert_eq!(ingredients[0].category, IngredientCategory::Good);
    }

    #[test]
    fn test_hidden_sugar_beats_healthy_keyword() {
        // "fruit" is a healthy keyword, but fructose is a hidden sugar and
        // the sugar table is consulted first
        let parser = create_parser();
        let ingredients = parser.parse("fruit fructose blend");
        assert_eq!(ingredients[0].category, IngredientCategory::Harmful);
    }
}
