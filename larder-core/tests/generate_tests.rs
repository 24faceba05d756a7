//! End-to-end generation tests against the fake provider.
//!
//! Each test drives `generate_recipe` through one terminal outcome: a recipe,
//! an input failure, a validation failure or an upstream failure.

use larder_core::llm::SAMPLE_RECIPE_JSON;
use larder_core::{
    generate_recipe, parse_recipe, render_generate_recipe_prompt, FakeProvider, GenerateError,
    GenerationLimits, GenerationRequest, LlmError, Recipe, RECIPE_JSON_SCHEMA,
};

fn request(ingredients: &str) -> GenerationRequest {
    GenerationRequest {
        ingredients: Some(ingredients.to_string()),
    }
}

#[tokio::test]
async fn valid_completion_yields_recipe() {
    let provider = FakeProvider::new().with_default_response(SAMPLE_RECIPE_JSON);

    let recipe = generate_recipe(
        &provider,
        &request("chicken, broccoli, lemon"),
        &GenerationLimits::default(),
    )
    .await
    .unwrap();

    let expected: Recipe = serde_json::from_str(SAMPLE_RECIPE_JSON).unwrap();
    assert_eq!(recipe, expected);
    assert_eq!(recipe.title, "Lemon Garlic Chicken with Broccoli");
    assert_eq!(recipe.ingredients.len(), 4);
    assert_eq!(recipe.instructions.len(), 3);
    assert_eq!(recipe.nutrition_info.calories.as_u64(), Some(380));
    assert_eq!(recipe.nutrition_info.protein, "42g");
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn recipe_serializes_with_camel_case_nutrition() {
    let recipe: Recipe = serde_json::from_str(SAMPLE_RECIPE_JSON).unwrap();
    let value = serde_json::to_value(&recipe).unwrap();
    let original: serde_json::Value = serde_json::from_str(SAMPLE_RECIPE_JSON).unwrap();
    assert_eq!(value, original);
}

#[tokio::test]
async fn prompt_sent_to_provider_contains_ingredients() {
    // Only answers when the prompt carries both the ingredients and the schema.
    let mut provider = FakeProvider::new();
    provider.add_response("quinoa, black beans", SAMPLE_RECIPE_JSON);

    let result = generate_recipe(
        &provider,
        &request("  quinoa, black beans  "),
        &GenerationLimits::default(),
    )
    .await;
    assert!(result.is_ok());

    let prompt = render_generate_recipe_prompt("quinoa, black beans");
    assert!(prompt.contains(RECIPE_JSON_SCHEMA));
}

#[tokio::test]
async fn missing_ingredients_never_call_provider() {
    let provider = FakeProvider::default();
    let limits = GenerationLimits::default();

    for req in [GenerationRequest::default(), request(""), request("   ")] {
        let err = generate_recipe(&provider, &req, &limits).await.unwrap_err();
        assert!(matches!(err, GenerateError::MissingIngredients));
    }
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn oversized_ingredients_never_call_provider() {
    let provider = FakeProvider::default();
    let limits = GenerationLimits {
        max_ingredients_chars: 10,
        ..Default::default()
    };

    let err = generate_recipe(&provider, &request("salt, pepper, thyme"), &limits)
        .await
        .unwrap_err();
    assert!(err.is_input_error());
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn non_json_completion_is_validation_failure_with_raw_text() {
    let provider = FakeProvider::new().with_default_response("not json");

    let err = generate_recipe(&provider, &request("eggs"), &GenerationLimits::default())
        .await
        .unwrap_err();

    assert!(matches!(err, GenerateError::InvalidResponse { .. }));
    assert_eq!(err.raw_response(), Some("not json"));
}

#[tokio::test]
async fn schema_mismatches_are_validation_failures() {
    let cases = [
        // missing nutritionInfo
        r#"{"title": "T", "description": "D", "ingredients": ["a"], "instructions": ["b"]}"#,
        // calories as a string
        r#"{"title": "T", "description": "D", "ingredients": ["a"], "instructions": ["b"],
            "nutritionInfo": {"calories": "300", "protein": "1g", "carbs": "2g", "fat": "3g"}}"#,
        // non-string list item
        r#"{"title": "T", "description": "D", "ingredients": ["a", 2], "instructions": ["b"],
            "nutritionInfo": {"calories": 300, "protein": "1g", "carbs": "2g", "fat": "3g"}}"#,
        // instructions as one string
        r#"{"title": "T", "description": "D", "ingredients": ["a"], "instructions": "b",
            "nutritionInfo": {"calories": 300, "protein": "1g", "carbs": "2g", "fat": "3g"}}"#,
        // protein as a number
        r#"{"title": "T", "description": "D", "ingredients": ["a"], "instructions": ["b"],
            "nutritionInfo": {"calories": 300, "protein": 1, "carbs": "2g", "fat": "3g"}}"#,
        // a JSON array instead of an object
        r#"[1, 2, 3]"#,
    ];

    for raw in cases {
        let provider = FakeProvider::new().with_default_response(raw);
        let err = generate_recipe(&provider, &request("eggs"), &GenerationLimits::default())
            .await
            .unwrap_err();
        assert_eq!(err.raw_response(), Some(raw), "case: {}", raw);
    }
}

#[tokio::test]
async fn fenced_completion_parses() {
    let fenced = format!("```json\n{}\n```", SAMPLE_RECIPE_JSON);
    let provider = FakeProvider::new().with_default_response(&fenced);

    let recipe = generate_recipe(&provider, &request("eggs"), &GenerationLimits::default())
        .await
        .unwrap();
    assert_eq!(recipe.nutrition_info.fat, "14g");
}

#[test]
fn same_line_fence_with_language_tag_parses() {
    let fenced = format!("```json {}```", SAMPLE_RECIPE_JSON);
    let recipe = parse_recipe(&fenced).unwrap();
    assert_eq!(recipe.nutrition_info.fat, "14g");
}

#[tokio::test]
async fn decimal_calories_are_preserved() {
    let raw = r#"{"title": "T", "description": "D", "ingredients": ["a"], "instructions": ["b"],
        "nutritionInfo": {"calories": 412.5, "protein": "1g", "carbs": "2g", "fat": "3g"}}"#;
    let provider = FakeProvider::new().with_default_response(raw);

    let recipe = generate_recipe(&provider, &request("eggs"), &GenerationLimits::default())
        .await
        .unwrap();
    assert_eq!(recipe.nutrition_info.calories.as_f64(), Some(412.5));
}

#[tokio::test]
async fn provider_failure_is_upstream_failure() {
    let provider = FakeProvider::failing("network unreachable");

    let err = generate_recipe(&provider, &request("eggs"), &GenerationLimits::default())
        .await
        .unwrap_err();

    match err {
        GenerateError::Upstream(LlmError::RequestFailed(message)) => {
            assert_eq!(message, "network unreachable");
        }
        other => panic!("expected upstream failure, got {:?}", other),
    }
}

#[tokio::test]
async fn failure_classification_is_repeatable() {
    let provider = FakeProvider::new().with_default_response("still not json");
    let limits = GenerationLimits::default();

    let first = generate_recipe(&provider, &request("eggs"), &limits)
        .await
        .unwrap_err();
    let second = generate_recipe(&provider, &request("eggs"), &limits)
        .await
        .unwrap_err();

    assert_eq!(first.user_message(), second.user_message());
    assert_eq!(first.raw_response(), second.raw_response());
    assert_eq!(provider.call_count(), 2);
}
