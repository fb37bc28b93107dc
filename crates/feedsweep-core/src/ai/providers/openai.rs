use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs, ResponseFormat,
    },
    Client,
};

use super::{Completion, TokenUsage, TopicProvider};
use crate::{Error, Result};

/// OpenAI API provider
pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAiProvider {
    pub fn new(api_key: &str, model: &str, temperature: f32, timeout_secs: u64) -> Self {
        Self::with_config(
            OpenAIConfig::new().with_api_key(api_key),
            model,
            temperature,
            timeout_secs,
        )
    }

    /// Point the client at another OpenAI-compatible endpoint
    pub fn with_api_base(
        api_key: &str,
        api_base: &str,
        model: &str,
        temperature: f32,
        timeout_secs: u64,
    ) -> Self {
        Self::with_config(
            OpenAIConfig::new()
                .with_api_key(api_key)
                .with_api_base(api_base),
            model,
            temperature,
            timeout_secs,
        )
    }

    fn with_config(config: OpenAIConfig, model: &str, temperature: f32, timeout_secs: u64) -> Self {
        let mut client = Client::with_config(config);
        match reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
        {
            Ok(http) => client = client.with_http_client(http),
            Err(e) => tracing::warn!("Falling back to default OpenAI HTTP client: {}", e),
        }

        Self {
            client,
            model: model.to_string(),
            temperature,
        }
    }
}

#[async_trait::async_trait]
impl TopicProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete_json(&self, system: &str, user: &str) -> Result<Completion> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system)
                .build()
                .map_err(|e| Error::AiProvider(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user)
                .build()
                .map_err(|e| Error::AiProvider(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .response_format(ResponseFormat::JsonObject)
            .build()
            .map_err(|e| Error::AiProvider(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| Error::AiProvider(e.to_string()))?;

        let usage = response.usage.map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
        });

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content);

        Ok(Completion { content, usage })
    }
}
