use async_trait::async_trait;
use rig::client::CompletionClient;
use rig::completion::Prompt;
use rig::providers::gemini;
use std::time::Duration;

use crate::domain::{
    ports::{CompletionRequest, CompletionResponse, LlmService},
    DomainError,
};
use crate::infrastructure::config::LlmConfig;
use crate::infrastructure::retry::with_timeout;

pub struct GeminiLlm {
    client: gemini::Client,
    model: String,
    timeout: Duration,
}

impl GeminiLlm {
    pub fn new(model: impl Into<String>, api_key: &str) -> Result<Self, DomainError> {
        let client = gemini::Client::new(api_key)
            .map_err(|e| DomainError::invalid_config(format!("gemini client: {e}")))?;

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
        let mut builder = self.client.agent(&self.model);
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
            .map_err(|e| DomainError::upstream(format!("gemini: {e}")))
    }
}

#[async_trait]
impl LlmService for GeminiLlm {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, DomainError> {
        let text = with_timeout(self.timeout, "gemini completion", self.prompt(request)).await?;
        Ok(CompletionResponse { text })
    }
}
