pub mod generate;
pub mod llm;
pub mod prompts;
pub mod types;

pub use generate::{
    generate_recipe, parse_recipe, validate_ingredients, GenerateError, GenerationLimits,
};
pub use llm::{
    create_provider, create_provider_from_env, AiConfig, FakeProvider, GeminiProvider, LlmError,
    LlmProvider,
};
pub use prompts::{render_generate_recipe_prompt, RECIPE_JSON_SCHEMA};
pub use types::{GenerationRequest, NutritionInfo, Recipe};
