mod document;
mod prompt;
mod rag;

pub use document::{DocumentService, IngestReport};
pub use prompt::{AssembledPrompt, PromptAssembler};
pub use rag::RagService;
