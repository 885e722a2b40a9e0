mod embedding;
mod llm;
mod vector_index;

pub use embedding::{EmbeddingRequest, EmbeddingResponse, EmbeddingService};
pub use llm::{CompletionRequest, CompletionResponse, LlmService};
pub use vector_index::VectorIndex;
