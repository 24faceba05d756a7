//! Recipe generation request and response types.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for recipe generation.
///
/// `ingredients` is optional on the wire so that a missing field is reported
/// the same way as an empty one.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct GenerationRequest {
    #[serde(default)]
    pub ingredients: Option<String>,
}

/// A generated recipe.
///
/// Only constructed by deserializing a model completion that matches this
/// shape exactly, so every field is always populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub title: String,
    pub description: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub nutrition_info: NutritionInfo,
}

/// Per-serving nutrition block of a [`Recipe`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NutritionInfo {
    /// Kept as the number the model produced (integer or decimal).
    #[schema(value_type = f64)]
    pub calories: serde_json::Number,
    pub protein: String,
    pub carbs: String,
    pub fat: String,
}
