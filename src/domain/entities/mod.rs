mod conversation;
mod document;
mod embedding;

pub use conversation::{Conversation, Message, MessageRole};
pub use document::{chunk_text, validate_chunking, Chunk, Document, SearchResult};
pub use embedding::Embedding;
