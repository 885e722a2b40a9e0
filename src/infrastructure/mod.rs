pub mod agent;
pub mod config;
pub mod embedding;
pub mod llm;
pub mod loader;
pub mod providers;
pub mod retry;
pub mod vector_store;

pub use agent::ChatOrchestrator;
pub use config::{AppConfig, Config, PromptsConfig};
pub use embedding::{HashingEmbedding, TextEmbedding};
pub use llm::{AnthropicLlm, GeminiLlm};
pub use loader::{decode_base64, load_pdf, load_text, WebLoader};
pub use providers::{build_embedder, build_llm};
pub use retry::RetryPolicy;
pub use vector_store::{InMemoryVectorIndex, IndexSnapshot, SessionSnapshot};
