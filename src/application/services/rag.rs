use std::sync::Arc;
use tracing::instrument;

use crate::domain::{
    ports::{EmbeddingService, VectorIndex},
    Chunk, DomainError, SearchResult,
};

/// Query-time retrieval: embed the question, rank the session's chunks.
pub struct RagService {
    embedding: Arc<dyn EmbeddingService>,
    default_top_k: usize,
}

impl RagService {
    pub fn new(embedding: Arc<dyn EmbeddingService>, default_top_k: usize) -> Self {
        Self {
            embedding,
            default_top_k,
        }
    }

    pub fn default_top_k(&self) -> usize {
        self.default_top_k
    }

    pub async fn retrieve_default(
        &self,
        index: &dyn VectorIndex,
        query: &str,
    ) -> Result<Vec<Chunk>, DomainError> {
        self.retrieve(index, query, self.default_top_k).await
    }

    /// Top `k` chunks for `query`, best first.
    pub async fn retrieve(
        &self,
        index: &dyn VectorIndex,
        query: &str,
        k: usize,
    ) -> Result<Vec<Chunk>, DomainError> {
        Ok(self
            .retrieve_scored(index, query, k)
            .await?
            .into_iter()
            .map(|r| r.chunk)
            .collect())
    }

    #[instrument(skip(self, index, query), fields(indexed = index.len()))]
    pub async fn retrieve_scored(
        &self,
        index: &dyn VectorIndex,
        query: &str,
        k: usize,
    ) -> Result<Vec<SearchResult>, DomainError> {
        if index.is_empty() {
            return Err(DomainError::EmptyIndex);
        }

        let embedding = self.embedding.embed(query).await?;
        let results = index.search(&embedding, k)?;

        tracing::debug!(
            returned = results.len(),
            top_score = results.first().map(|r| r.score),
            "chunks retrieved"
        );
        Ok(results)
    }
}
