use std::sync::Arc;

use crate::domain::{
    ports::{EmbeddingService, LlmService},
    DomainError,
};
use crate::infrastructure::config::{EmbeddingConfig, LlmConfig};
use crate::infrastructure::embedding::{HashingEmbedding, TextEmbedding};
use crate::infrastructure::llm::{AnthropicLlm, GeminiLlm};

pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";

pub fn build_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingService>, DomainError> {
    build_embedder_with(config, |key| std::env::var(key).ok())
}

pub fn build_llm(config: &LlmConfig) -> Result<Arc<dyn LlmService>, DomainError> {
    build_llm_with(config, |key| std::env::var(key).ok())
}

/// Like [`build_embedder`], with API keys read through `lookup`.
pub fn build_embedder_with<F>(
    config: &EmbeddingConfig,
    lookup: F,
) -> Result<Arc<dyn EmbeddingService>, DomainError>
where
    F: Fn(&str) -> Option<String>,
{
    match config.provider.as_str() {
        "openai" => {
            let key = api_key(&lookup, OPENAI_API_KEY)?;
            Ok(Arc::new(TextEmbedding::from_config(config, &key)?))
        }
        "hashing" => Ok(Arc::new(HashingEmbedding::new(config.dimension))),
        other => Err(DomainError::invalid_config(format!(
            "unknown embedding provider '{other}'"
        ))),
    }
}

/// Like [`build_llm`], with API keys read through `lookup`.
pub fn build_llm_with<F>(config: &LlmConfig, lookup: F) -> Result<Arc<dyn LlmService>, DomainError>
where
    F: Fn(&str) -> Option<String>,
{
    match config.provider.as_str() {
        "gemini" => {
            let key = api_key(&lookup, GEMINI_API_KEY)?;
            Ok(Arc::new(GeminiLlm::from_config(config, &key)?))
        }
        "anthropic" => {
            let key = api_key(&lookup, ANTHROPIC_API_KEY)?;
            Ok(Arc::new(AnthropicLlm::from_config(config, &key)?))
        }
        other => Err(DomainError::invalid_config(format!(
            "unknown llm provider '{other}'"
        ))),
    }
}

fn api_key<F>(lookup: &F, name: &str) -> Result<String, DomainError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .ok_or_else(|| DomainError::invalid_config(format!("{name} is not set")))
}
