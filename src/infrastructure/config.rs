use serde::Deserialize;
use std::path::Path;

use crate::domain::{validate_chunking, DomainError};

pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant answering questions about a \
single document. Answer only from the context passages provided. If the answer is not in the \
context, say that it was not found in the document.";

pub const LLM_PROVIDERS: &[&str] = &["gemini", "anthropic"];
pub const EMBEDDING_PROVIDERS: &[&str] = &["openai", "hashing"];

/// Loaded settings plus prompt templates.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(flatten)]
    pub config: Config,
    #[serde(default)]
    pub prompts: PromptsConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub rag: RagConfig,
    pub retry: RetryConfig,
    pub loader: LoaderConfig,
    pub session: SessionConfig,
    pub server: ServerConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: String,
    pub model: String,
    pub temperature: f64,
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model: "gemini-2.0-flash".to_string(),
            temperature: 0.7,
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: String,
    pub model: String,
    pub dimension: usize,
    pub batch_size: usize,
    pub timeout_seconds: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimension: 1536,
            batch_size: 64,
            timeout_seconds: 30,
        }
    }
}

/// Chunking, retrieval and prompt budget. Sizes are in chars.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    pub max_prompt_chars: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: 4,
            max_prompt_chars: 12_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts, the first call included.
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 500,
            max_backoff_ms: 8_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Bound on fetching a document from a URL.
    pub timeout_seconds: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self { timeout_seconds: 10 }
    }
}

/// Sessions untouched for `idle_ttl_seconds` are dropped by a sweep that
/// runs every `sweep_interval_seconds`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub idle_ttl_seconds: u64,
    pub sweep_interval_seconds: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_ttl_seconds: 3_600,
            sweep_interval_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    pub system: String,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            system: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

impl AppConfig {
    /// Reads `DOC_CHAT_CONFIG` (or `config.yaml`), applies env overrides and validates.
    /// A missing file means defaults.
    pub fn load() -> Result<Self, DomainError> {
        let path =
            std::env::var("DOC_CHAT_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let mut config = if Path::new(&path).exists() {
            Self::from_file(&path)?
        } else {
            tracing::info!(path, "config file not found, using defaults");
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            DomainError::invalid_config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, DomainError> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| DomainError::invalid_config(format!("invalid YAML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Overlays values from environment-like lookup. Takes a closure so tests
    /// do not have to mutate the process environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), DomainError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("DOC_CHAT_LLM_PROVIDER") {
            self.config.llm.provider = v;
        }
        if let Some(v) = lookup("DOC_CHAT_LLM_MODEL") {
            self.config.llm.model = v;
        }
        if let Some(v) = lookup("DOC_CHAT_EMBEDDING_PROVIDER") {
            self.config.embedding.provider = v;
        }
        if let Some(v) = lookup("DOC_CHAT_TOP_K") {
            self.config.rag.top_k = parse_env("DOC_CHAT_TOP_K", &v)?;
        }
        if let Some(v) = lookup("SERVER_HOST") {
            self.config.server.host = v;
        }
        if let Some(v) = lookup("SERVER_PORT") {
            self.config.server.port = parse_env("SERVER_PORT", &v)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        let c = &self.config;

        validate_chunking(c.rag.chunk_size, c.rag.chunk_overlap)?;

        if c.rag.top_k == 0 {
            return Err(DomainError::invalid_config("rag.top_k must be greater than 0"));
        }
        if c.rag.max_prompt_chars == 0 {
            return Err(DomainError::invalid_config(
                "rag.max_prompt_chars must be greater than 0",
            ));
        }
        if !LLM_PROVIDERS.contains(&c.llm.provider.as_str()) {
            return Err(DomainError::invalid_config(format!(
                "unknown llm.provider '{}', expected one of: {}",
                c.llm.provider,
                LLM_PROVIDERS.join(", ")
            )));
        }
        if !EMBEDDING_PROVIDERS.contains(&c.embedding.provider.as_str()) {
            return Err(DomainError::invalid_config(format!(
                "unknown embedding.provider '{}', expected one of: {}",
                c.embedding.provider,
                EMBEDDING_PROVIDERS.join(", ")
            )));
        }
        if c.embedding.dimension == 0 || c.embedding.batch_size == 0 {
            return Err(DomainError::invalid_config(
                "embedding.dimension and embedding.batch_size must be greater than 0",
            ));
        }
        if c.llm.timeout_seconds == 0
            || c.embedding.timeout_seconds == 0
            || c.loader.timeout_seconds == 0
        {
            return Err(DomainError::invalid_config("timeouts must be greater than 0"));
        }
        if c.session.idle_ttl_seconds == 0 || c.session.sweep_interval_seconds == 0 {
            return Err(DomainError::invalid_config(
                "session.idle_ttl_seconds and session.sweep_interval_seconds must be greater than 0",
            ));
        }
        if c.retry.max_attempts == 0 {
            return Err(DomainError::invalid_config(
                "retry.max_attempts must be at least 1",
            ));
        }
        if c.retry.initial_backoff_ms > c.retry.max_backoff_ms {
            return Err(DomainError::invalid_config(
                "retry.initial_backoff_ms must not exceed retry.max_backoff_ms",
            ));
        }
        if self.prompts.system.trim().is_empty() {
            return Err(DomainError::invalid_config("prompts.system must not be empty"));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, DomainError> {
    value
        .trim()
        .parse()
        .map_err(|_| DomainError::invalid_config(format!("{key} has invalid value '{value}'")))
}
