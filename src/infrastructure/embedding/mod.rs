mod hashing;
mod text;

pub use hashing::HashingEmbedding;
pub use text::TextEmbedding;
