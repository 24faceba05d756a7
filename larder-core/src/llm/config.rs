//! AI configuration from environment variables.

use std::env;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Default Generative Language API base URL.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model to use.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),
}

/// Which [`LlmProvider`](super::LlmProvider) to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
    Fake,
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "fake" => Ok(Self::Fake),
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gemini => f.write_str("gemini"),
            Self::Fake => f.write_str("fake"),
        }
    }
}

/// AI client configuration.
#[derive(Clone)]
pub struct AiConfig {
    pub provider: ProviderKind,
    /// API key for the provider. Always set when `provider` is Gemini.
    pub api_key: Option<String>,
    /// Model name (e.g., "gemini-1.5-flash").
    pub model: String,
    /// Base URL for the API.
    pub base_url: String,
}

// Hand-written so the API key never ends up in logs.
impl fmt::Debug for AiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AiConfig")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl AiConfig {
    /// Load configuration from environment variables.
    ///
    /// - `LARDER_AI_PROVIDER`: "gemini" (default) or "fake"
    /// - `GEMINI_API_KEY`: required for gemini
    /// - `LARDER_AI_MODEL`: model name (default: "gemini-1.5-flash")
    /// - `LARDER_AI_BASE_URL`: API base URL
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let provider = match lookup("LARDER_AI_PROVIDER") {
            Some(value) => value.parse()?,
            None => ProviderKind::Gemini,
        };

        let api_key = lookup("GEMINI_API_KEY").filter(|k| !k.trim().is_empty());
        if provider == ProviderKind::Gemini && api_key.is_none() {
            return Err(ConfigError::MissingEnvVar("GEMINI_API_KEY".to_string()));
        }

        let model = lookup("LARDER_AI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let base_url = lookup("LARDER_AI_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            provider,
            api_key,
            model,
            base_url,
        })
    }
}
