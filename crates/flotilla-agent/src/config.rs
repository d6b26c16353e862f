use flotilla_core::{FlotillaError, FlotillaResult};
use serde::{Deserialize, Serialize};

/// Supported LLM API providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Anthropic Claude.
    Claude,
    /// OpenAI.
    OpenAi,
    /// OpenRouter — routes to many upstream models behind one API.
    OpenRouter,
    /// Groq cloud inference — OpenAI-compatible API.
    Groq,
}

/// Model configuration attached to a worker agent.
///
/// The orchestrator core never calls a model itself; this config is
/// validated at agent construction and forwarded to the job handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API provider.
    pub provider: LlmProvider,
    /// Provider-specific model identifier.
    pub model_name: String,
    /// API key.
    pub api_key: String,
    /// Overrides the provider's default endpoint.
    pub api_base_url: Option<String>,
    /// Sampling temperature, in `[0, 2]`.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Completion token budget per call.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    4096
}

impl LlmConfig {
    /// Creates a config with default sampling settings.
    pub fn new(
        provider: LlmProvider,
        model_name: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            model_name: model_name.into(),
            api_key: api_key.into(),
            api_base_url: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }

    /// Checks the config is usable for agent construction.
    pub fn validate(&self) -> FlotillaResult<()> {
        if self.model_name.trim().is_empty() {
            return Err(FlotillaError::Config("model_name must not be empty".into()));
        }
        if self.api_key.trim().is_empty() {
            return Err(FlotillaError::Config("api_key must not be empty".into()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(FlotillaError::Config(format!(
                "temperature {} outside [0, 2]",
                self.temperature
            )));
        }
        Ok(())
    }
}
