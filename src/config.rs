//! Engine configuration.
//!
//! Everything the engine needs is carried in an immutable [`EngineConfig`]
//! injected at construction time. There is no ambient global state; the prompt
//! composer and parser stay pure and the engine stays testable.

use std::env;
use std::time::Duration;

use tracing::warn;

/// Default Gemini model for classification calls.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Minimum spacing between live API requests.
pub const DEFAULT_REQUEST_INTERVAL: Duration = Duration::from_secs(2);

/// What a given API call is for. Selects the sampling temperature:
/// classification wants near-deterministic categorical output, tips want
/// variety, error messages sit in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    Classification,
    TipGeneration,
    ErrorMessage,
}

impl Task {
    pub fn temperature(self) -> f32 {
        match self {
            Task::Classification => 0.1,
            Task::TipGeneration => 0.7,
            Task::ErrorMessage => 0.3,
        }
    }
}

/// Immutable engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Gemini model identifier.
    pub model: String,
    /// API key. `None` switches the engine to mock mode.
    pub api_key: Option<String>,
    /// Token cap for generated responses.
    pub max_output_tokens: u32,
    /// Minimum spacing between live API requests.
    pub min_request_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            max_output_tokens: 1024,
            min_request_interval: DEFAULT_REQUEST_INTERVAL,
        }
    }
}

impl EngineConfig {
    /// Build a config from the environment: `GOOGLE_API_KEY` for the key,
    /// `ECOSORT_MODEL` to override the model. A missing key is not an error;
    /// the engine falls back to mock mode for local development.
    pub fn from_env() -> Self {
        let api_key = env::var("GOOGLE_API_KEY").ok().filter(|k| !k.is_empty());
        if api_key.is_none() {
            warn!("GOOGLE_API_KEY not configured - engine will use mock mode");
        }
        let model = env::var("ECOSORT_MODEL")
            .ok()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        EngineConfig {
            model,
            api_key,
            ..EngineConfig::default()
        }
    }

    /// Config with an explicit key, for callers that fetch secrets themselves.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        EngineConfig {
            api_key: Some(api_key.into()),
            ..EngineConfig::default()
        }
    }
}

/// Initialize tracing with an env-filter, defaulting to `info`.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
