//! Recipe generation: validate input, prompt the model, parse its answer.
//!
//! Each call ends in exactly one of four outcomes: a [`Recipe`], or one of the
//! [`GenerateError`] classes (bad input, unusable model output, upstream
//! failure). Nothing is retried and nothing is remembered between calls.

use std::env;
use std::str::FromStr;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::llm::{LlmError, LlmProvider};
use crate::prompts::generate_recipe::{render_generate_recipe_prompt, GENERATE_RECIPE_PROMPT_NAME};
use crate::types::{GenerationRequest, Recipe};

pub const MISSING_INGREDIENTS_MESSAGE: &str = "Please provide ingredients";
pub const INGREDIENTS_TOO_LONG_MESSAGE: &str = "Ingredients list is too long";
pub const INVALID_RESPONSE_MESSAGE: &str =
    "Failed to parse recipe data from AI. The format might be incorrect.";
pub const UPSTREAM_FAILURE_MESSAGE: &str = "Failed to generate recipe. Please try again.";

/// Default time allowed for a single model call.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Default upper bound on the ingredient text, in characters.
pub const DEFAULT_MAX_INGREDIENTS_CHARS: usize = 2000;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("{}", MISSING_INGREDIENTS_MESSAGE)]
    MissingIngredients,

    #[error("Ingredients list is too long ({len} > {max} characters)")]
    IngredientsTooLong { len: usize, max: usize },

    #[error("Model output is not a valid recipe: {reason}")]
    InvalidResponse { reason: String, raw: String },

    #[error("Model call failed: {0}")]
    Upstream(#[from] LlmError),
}

impl GenerateError {
    /// The message shown to API callers. Upstream detail stays in the logs.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::MissingIngredients => MISSING_INGREDIENTS_MESSAGE,
            Self::IngredientsTooLong { .. } => INGREDIENTS_TOO_LONG_MESSAGE,
            Self::InvalidResponse { .. } => INVALID_RESPONSE_MESSAGE,
            Self::Upstream(_) => UPSTREAM_FAILURE_MESSAGE,
        }
    }

    /// The verbatim model output, for failures caused by it.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Self::InvalidResponse { raw, .. } => Some(raw),
            _ => None,
        }
    }

    /// True when the caller can fix the failure by changing the request.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::MissingIngredients | Self::IngredientsTooLong { .. })
    }
}

/// Limits applied to every generation call.
#[derive(Debug, Clone)]
pub struct GenerationLimits {
    pub timeout: Duration,
    pub max_ingredients_chars: usize,
}

impl Default for GenerationLimits {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_ingredients_chars: DEFAULT_MAX_INGREDIENTS_CHARS,
        }
    }
}

impl GenerationLimits {
    /// Load limits from environment variables.
    ///
    /// - `LARDER_GENERATION_TIMEOUT_SECS` (default: 60)
    /// - `LARDER_MAX_INGREDIENTS_CHARS` (default: 2000)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load limits through an arbitrary variable lookup.
    ///
    /// Unparseable or zero values fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let timeout_secs = parse_positive(
            &lookup,
            "LARDER_GENERATION_TIMEOUT_SECS",
            DEFAULT_TIMEOUT_SECS,
        );
        let max_ingredients_chars = parse_positive(
            &lookup,
            "LARDER_MAX_INGREDIENTS_CHARS",
            DEFAULT_MAX_INGREDIENTS_CHARS,
        );

        Self {
            timeout: Duration::from_secs(timeout_secs),
            max_ingredients_chars,
        }
    }
}

fn parse_positive<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + PartialOrd + Default + Copy + std::fmt::Display,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().parse::<T>() {
        Ok(value) if value > T::default() => value,
        _ => {
            tracing::warn!(key, value = %raw, default = %default, "Invalid value, using default");
            default
        }
    }
}

/// Check the request and return the trimmed ingredient text.
pub fn validate_ingredients<'a>(
    request: &'a GenerationRequest,
    limits: &GenerationLimits,
) -> Result<&'a str, GenerateError> {
    let ingredients = request
        .ingredients
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(GenerateError::MissingIngredients)?;

    let len = ingredients.chars().count();
    if len > limits.max_ingredients_chars {
        return Err(GenerateError::IngredientsTooLong {
            len,
            max: limits.max_ingredients_chars,
        });
    }

    Ok(ingredients)
}

/// Strip one enclosing Markdown code fence, if the whole text is fenced.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(body) = trimmed
        .strip_prefix("```")
        .and_then(|rest| rest.strip_suffix("```"))
    else {
        return trimmed;
    };

    // The fence may open with an info string such as "json", on its own line
    // or directly before the payload.
    let body = body.trim();
    let payload_start = body.find(|c| c == '{' || c == '[').unwrap_or(0);
    let is_info_word = body[..payload_start]
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || c == '-' || c == '_');

    if is_info_word {
        body[payload_start..].trim()
    } else {
        body
    }
}

/// Parse a raw completion into a [`Recipe`].
///
/// Fails unless every field is present with the right type. `raw` is carried
/// unchanged in the error.
pub fn parse_recipe(raw: &str) -> Result<Recipe, GenerateError> {
    serde_json::from_str(strip_code_fence(raw)).map_err(|e| GenerateError::InvalidResponse {
        reason: e.to_string(),
        raw: raw.to_string(),
    })
}

/// Run one generation: validate, prompt, call the model (time-boxed), parse.
pub async fn generate_recipe(
    provider: &dyn LlmProvider,
    request: &GenerationRequest,
    limits: &GenerationLimits,
) -> Result<Recipe, GenerateError> {
    let ingredients = validate_ingredients(request, limits)?;
    let prompt = render_generate_recipe_prompt(ingredients);

    tracing::debug!(
        prompt_name = GENERATE_RECIPE_PROMPT_NAME,
        provider = provider.provider_name(),
        model = provider.model_name(),
        "Calling LLM"
    );

    let started = Instant::now();
    let raw = tokio::time::timeout(limits.timeout, provider.complete(&prompt))
        .await
        .map_err(|_| LlmError::Timeout(limits.timeout.as_secs()))
        .and_then(|result| result)
        .inspect_err(|e| {
            tracing::error!(
                provider = provider.provider_name(),
                error = %e,
                "Recipe generation failed"
            );
        })?;

    tracing::debug!(
        provider = provider.provider_name(),
        latency_ms = %started.elapsed().as_millis(),
        response_len = raw.len(),
        "LLM responded"
    );

    parse_recipe(&raw).inspect_err(|e| {
        tracing::error!(error = %e, raw_response = %raw, "Failed to parse model response");
    })
}
