//! LLM provider abstraction for recipe generation.
//!
//! The model is an opaque remote capability: a prompt goes in, free text comes
//! out, and the call may fail or take arbitrarily long. Everything above this
//! module talks to it through [`LlmProvider`] so tests can substitute
//! [`FakeProvider`].

mod config;
mod fake;
mod gemini;

pub use config::{AiConfig, ConfigError, ProviderKind};
pub use fake::{FakeProvider, SAMPLE_RECIPE_JSON};
pub use gemini::GeminiProvider;

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Error type for LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("API returned error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Rate limited, retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Model returned no text: {0}")]
    EmptyResponse(String),

    #[error("No response within {0} seconds")]
    Timeout(u64),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

/// Trait for LLM providers.
///
/// Implementations must be stateless with respect to requests and safe to
/// share across tasks. The provider makes the API call and returns the
/// model's text response untouched.
#[async_trait]
pub trait LlmProvider: Send + Sync + fmt::Debug {
    /// Send a prompt to the LLM and get a text response.
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;

    /// Get the provider name (e.g., "gemini", "fake").
    fn provider_name(&self) -> &'static str;

    /// Get the model name (e.g., "gemini-1.5-flash").
    fn model_name(&self) -> &str;
}

/// Build the provider selected by `config`.
pub fn create_provider(config: &AiConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    match config.provider {
        ProviderKind::Fake => Ok(Arc::new(FakeProvider::default())),
        ProviderKind::Gemini => {
            let api_key = config
                .api_key
                .clone()
                .ok_or_else(|| LlmError::NotConfigured("GEMINI_API_KEY not set".to_string()))?;
            let provider = GeminiProvider::new(api_key, config.model.clone())
                .with_base_url(config.base_url.clone());
            Ok(Arc::new(provider))
        }
    }
}

/// Build the provider from environment configuration.
///
/// See [`AiConfig::from_env`] for the variables read.
pub fn create_provider_from_env() -> Result<Arc<dyn LlmProvider>, LlmError> {
    let config = AiConfig::from_env().map_err(|e| LlmError::NotConfigured(e.to_string()))?;
    create_provider(&config)
}
