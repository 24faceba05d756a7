//! AI prompt templates.

pub mod generate_recipe;

pub use generate_recipe::{render_generate_recipe_prompt, RECIPE_JSON_SCHEMA};
