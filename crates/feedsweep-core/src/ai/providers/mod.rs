mod claude_api;
mod openai;

use std::sync::Arc;

pub use claude_api::ClaudeApiProvider;
pub use openai::OpenAiProvider;

use crate::config::AiConfig;
use crate::Result;

/// Token counts reported by a provider for one request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl TokenUsage {
    pub fn add(&mut self, other: TokenUsage) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
    }

    /// Estimated cost in USD given per-million-token prices
    pub fn cost(&self, input_per_million: f64, output_per_million: f64) -> f64 {
        (self.prompt_tokens as f64 * input_per_million
            + self.completion_tokens as f64 * output_per_million)
            / 1_000_000.0
    }
}

/// Raw provider reply; validation happens in the topic filter
#[derive(Debug, Clone, Default)]
pub struct Completion {
    pub content: Option<String>,
    pub usage: Option<TokenUsage>,
}

/// A chat model that can answer with a JSON object
#[async_trait::async_trait]
pub trait TopicProvider: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &str;

    /// Send a system + user prompt pair, asking for a JSON object back
    async fn complete_json(&self, system: &str, user: &str) -> Result<Completion>;
}

/// Build the configured provider
///
/// Returns `None` when AI is disabled, the provider is unknown or its API key
/// is missing. The reason is logged; the caller treats it as "no AI filter".
pub fn build_provider(config: &AiConfig) -> Option<Arc<dyn TopicProvider>> {
    if !config.enabled {
        tracing::debug!("AI topic filter disabled in configuration");
        return None;
    }

    fn key(value: &Option<String>) -> Option<&str> {
        value.as_deref().filter(|k| !k.trim().is_empty())
    }

    let provider: Arc<dyn TopicProvider> = match config.provider.as_str() {
        "openai" => {
            let Some(api_key) = key(&config.openai_api_key) else {
                tracing::warn!("OpenAI API key not found, AI topic filter unavailable");
                return None;
            };
            Arc::new(OpenAiProvider::new(
                api_key,
                &config.openai_model,
                config.temperature,
                config.request_timeout_secs,
            ))
        }
        "claude_api" => {
            let Some(api_key) = key(&config.claude_api_key) else {
                tracing::warn!("Claude API key not found, AI topic filter unavailable");
                return None;
            };
            Arc::new(ClaudeApiProvider::new(
                api_key,
                &config.claude_model,
                config.temperature,
                config.request_timeout_secs,
            ))
        }
        other => {
            tracing::warn!("Unknown AI provider '{}', AI topic filter unavailable", other);
            return None;
        }
    };

    tracing::debug!("Using AI provider: {}", provider.name());
    Some(provider)
}
