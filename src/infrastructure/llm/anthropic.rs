use async_trait::async_trait;
use rig::client::CompletionClient;
use rig::completion::Prompt;
use rig::providers::anthropic;
use std::time::Duration;

use crate::domain::{
    ports::{CompletionRequest, CompletionResponse, LlmService},
    DomainError,
};
use crate::infrastructure::config::LlmConfig;
use crate::infrastructure::retry::with_timeout;

const MAX_TOKENS: u64 = 4096;

pub struct AnthropicLlm {
    client: anthropic::Client,
    model: String,
    timeout: Duration,
}

impl AnthropicLlm {
    pub fn new(model: impl Into<String>, api_key: &str) -> Result<Self, DomainError> {
        let client = anthropic::Client::builder()
            .api_key(api_key)
            .build()
            .map_err(|e| DomainError::invalid_config(format!("anthropic client: {e}")))?;

        Ok(Self {
            client,
            model: model.into(),
            timeout: Duration::from_secs(30),
        })
    }

    pub fn from_config(config: &LlmConfig, api_key: &str) -> Result<Self, DomainError> {
        Ok(Self::new(&config.model, api_key)?
            .with_timeout(Duration::from_secs(config.timeout_seconds)))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn prompt(&self, request: CompletionRequest) -> Result<String, DomainError> {
        let mut builder = self.client.agent(&self.model).max_tokens(MAX_TOKENS);
        if let Some(system) = &request.system {
            builder = builder.preamble(system);
        }
        if let Some(temperature) = request.temperature {
            builder = builder.temperature(temperature);
        }

        builder
            .build()
            .prompt(request.prompt.as_str())
            .await
            .map_err(|e| DomainError::upstream(format!("anthropic: {e}")))
    }
}

#[async_trait]
impl LlmService for AnthropicLlm {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, DomainError> {
        let text = with_timeout(self.timeout, "anthropic completion", self.prompt(request)).await?;
        Ok(CompletionResponse { text })
    }
}
