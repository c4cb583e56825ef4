// factory-sim-config/src/config.rs
// ============================================================================
// Module: Configuration Loading
// Description: Reads the pipeline's environment variables and fails closed
//              on a missing required key.
// Purpose: Keep every env var name and default in one place instead of
//          scattering `std::env::var` calls across the CLI and HTTP crates.
// Dependencies: std::env, thiserror
// ============================================================================

//! ## Overview
//! [`FactorySimConfig::from_env`] is the one entry point. A missing
//! `OPENAI_API_KEY` is a hard [`ConfigError`] — the CLI and HTTP crates exit
//! non-zero on it at startup, per §6. This is distinct from the pipeline's
//! own runtime tolerance of `LLM_TRANSPORT` failures from a gateway that
//! *is* configured but unreachable; a missing key never reaches the gateway
//! at all.

use std::env;
use std::time::Duration;

use thiserror::Error;

/// Environment variable carrying the provider API key.
pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";
/// Environment variable carrying the CORS allow-list.
pub const CORS_ORIGINS_VAR: &str = "BACKEND_CORS_ORIGINS";
/// Environment variable overriding the gateway's per-call timeout.
pub const LLM_TIMEOUT_MS_VAR: &str = "FACTORY_SIM_LLM_TIMEOUT_MS";
/// Environment variable overriding the chat completion model name.
pub const LLM_MODEL_VAR: &str = "FACTORY_SIM_MODEL";
/// Environment variable overriding the provider base URL.
pub const LLM_BASE_URL_VAR: &str = "FACTORY_SIM_BASE_URL";

/// Default chat completion model when [`LLM_MODEL_VAR`] is unset.
const DEFAULT_MODEL: &str = "gpt-4o-mini";
/// Default provider base URL when [`LLM_BASE_URL_VAR`] is unset.
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
/// Default per-call timeout in milliseconds when [`LLM_TIMEOUT_MS_VAR`] is unset.
const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Errors raised while loading configuration from the environment.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required environment variable was absent.
    #[error("missing required environment variable: {0}")]
    MissingRequired(String),
    /// An environment variable was present but not parseable.
    #[error("invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Gateway connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Provider API key.
    pub api_key: String,
    /// Chat completion model identifier.
    pub model: String,
    /// Provider base URL.
    pub base_url: String,
    /// Per-call timeout in milliseconds.
    pub timeout_ms: u64,
}

impl GatewayConfig {
    /// Returns [`Self::timeout_ms`] as a [`Duration`].
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// CORS allow-list for the HTTP binding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorsConfig {
    /// Allowed origins; empty means no cross-origin access is permitted.
    pub allowed_origins: Vec<String>,
}

/// Full configuration for the pipeline's bindings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactorySimConfig {
    /// Gateway connection settings.
    pub gateway: GatewayConfig,
    /// HTTP CORS allow-list.
    pub cors: CorsConfig,
}

impl FactorySimConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequired`] if `OPENAI_API_KEY` is
    /// absent, or [`ConfigError::InvalidValue`] if
    /// `FACTORY_SIM_LLM_TIMEOUT_MS` is present but not a positive integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = env::var(OPENAI_API_KEY_VAR)
            .map_err(|_| ConfigError::MissingRequired(OPENAI_API_KEY_VAR.to_owned()))?;

        let model = env::var(LLM_MODEL_VAR).unwrap_or_else(|_| DEFAULT_MODEL.to_owned());
        let base_url = env::var(LLM_BASE_URL_VAR).unwrap_or_else(|_| DEFAULT_BASE_URL.to_owned());

        let timeout_ms = match env::var(LLM_TIMEOUT_MS_VAR) {
            Ok(raw) => raw
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidValue(LLM_TIMEOUT_MS_VAR.to_owned(), raw))?,
            Err(_) => DEFAULT_TIMEOUT_MS,
        };

        let allowed_origins = env::var(CORS_ORIGINS_VAR)
            .map(|raw| raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_owned).collect())
            .unwrap_or_default();

        Ok(Self {
            gateway: GatewayConfig { api_key, model, base_url, timeout_ms },
            cors: CorsConfig { allowed_origins },
        })
    }
}
