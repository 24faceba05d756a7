//! Recipe generation prompt.

/// Prompt name used in logs.
pub const GENERATE_RECIPE_PROMPT_NAME: &str = "generate_recipe";

/// The JSON shape the model is asked to return.
pub const RECIPE_JSON_SCHEMA: &str = r#"{
  "title": "Recipe Title",
  "description": "Brief description of the recipe",
  "ingredients": ["list of ingredients with quantities"],
  "instructions": ["step by step instructions"],
  "nutritionInfo": {
    "calories": number,
    "protein": "Xg",
    "carbs": "Xg",
    "fat": "Xg"
  }
}"#;

/// Render the generation prompt for the given ingredient list.
///
/// The ingredients are embedded verbatim.
pub fn render_generate_recipe_prompt(ingredients: &str) -> String {
    format!(
        "Create a healthy recipe using these ingredients: {ingredients}.\n\
         Please provide the recipe in the following JSON format:\n\
         {schema}\n\
         Respond with JSON only, no other text.",
        ingredients = ingredients,
        schema = RECIPE_JSON_SCHEMA
    )
}
