use crate::domain::{errors::DomainError, Chunk, Embedding, SearchResult};

/// Nearest-neighbour store over the chunks of one document.
///
/// `search` returns at most `k` results ordered by descending cosine
/// similarity, ties broken by ascending chunk index. Searching an index that
/// holds no entries is an error rather than an empty result.
pub trait VectorIndex: Send + Sync {
    /// Replaces all existing entries.
    fn build(&mut self, entries: Vec<(Chunk, Embedding)>) -> Result<(), DomainError>;

    fn search(&self, query: &Embedding, k: usize) -> Result<Vec<SearchResult>, DomainError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Vector width, `None` until built with at least one entry.
    fn dimension(&self) -> Option<usize>;

    /// Copy of the stored entries in chunk order. Vectors may come back
    /// normalised; rankings are unaffected.
    fn entries(&self) -> Vec<(Chunk, Embedding)>;
}
