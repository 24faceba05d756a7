//! Server configuration from environment variables.

use larder_core::llm::{AiConfig, ConfigError};
use larder_core::GenerationLimits;
use std::env;
use std::net::SocketAddr;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Bearer tokens accepted on protected routes.
    pub api_tokens: Vec<String>,
    pub ai: AiConfig,
    pub limits: GenerationLimits,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// - `LARDER_BIND_ADDR`: listen address (default: "0.0.0.0:3000")
    /// - `LARDER_API_TOKENS`: comma-separated bearer tokens
    ///
    /// plus everything read by [`AiConfig`] and [`GenerationLimits`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr = match lookup("LARDER_BIND_ADDR").map(|v| v.parse::<SocketAddr>()) {
            Some(Ok(addr)) => addr,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "Invalid LARDER_BIND_ADDR, using {}", DEFAULT_BIND_ADDR);
                default_bind_addr()
            }
            None => default_bind_addr(),
        };

        let api_tokens = lookup("LARDER_API_TOKENS")
            .map(|v| parse_tokens(&v))
            .unwrap_or_default();

        Ok(Self {
            bind_addr,
            api_tokens,
            ai: AiConfig::from_lookup(&lookup)?,
            limits: GenerationLimits::from_lookup(&lookup),
        })
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3000))
}

fn parse_tokens(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
