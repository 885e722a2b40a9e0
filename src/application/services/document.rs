use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::domain::{
    chunk_text, ports::EmbeddingService, validate_chunking, Chunk, Document, DomainError,
    Embedding,
};

/// Build phase: split a document and embed every chunk.
pub struct DocumentService {
    embedding: Arc<dyn EmbeddingService>,
    chunk_size: usize,
    chunk_overlap: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub document_id: Uuid,
    pub source: String,
    pub chars: usize,
    pub chunks: usize,
    pub dimension: Option<usize>,
}

impl DocumentService {
    pub fn new(
        embedding: Arc<dyn EmbeddingService>,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> Result<Self, DomainError> {
        validate_chunking(chunk_size, chunk_overlap)?;
        Ok(Self {
            embedding,
            chunk_size,
            chunk_overlap,
        })
    }

    /// Vector width the configured embedder produces.
    pub fn dimension(&self) -> usize {
        self.embedding.dimension()
    }

    #[instrument(skip(self, document), fields(source = %document.source))]
    pub fn chunk(&self, document: &Document) -> Result<Vec<Chunk>, DomainError> {
        if document.content.trim().is_empty() {
            return Err(DomainError::validation(format!(
                "document {} has no text",
                document.source
            )));
        }

        let chunks = chunk_text(&document.content, self.chunk_size, self.chunk_overlap)?;
        tracing::debug!(chunks = chunks.len(), "document chunked");
        Ok(chunks)
    }

    /// Pairs each chunk with its vector, preserving chunk order.
    #[instrument(skip(self, chunks), fields(count = chunks.len()))]
    pub async fn embed_chunks(
        &self,
        chunks: &[Chunk],
    ) -> Result<Vec<(Chunk, Embedding)>, DomainError> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedding.embed_many(&texts).await?;

        if let Some(first) = embeddings.first() {
            if first.dimension() != self.embedding.dimension() {
                tracing::warn!(
                    configured = self.embedding.dimension(),
                    actual = first.dimension(),
                    "embedding dimension differs from configuration"
                );
            }
        }

        Ok(chunks.iter().cloned().zip(embeddings).collect())
    }
}

impl IngestReport {
    pub fn new(document: &Document, chunks: usize, dimension: Option<usize>) -> Self {
        Self {
            document_id: document.id,
            source: document.source.clone(),
            chars: document.char_len(),
            chunks,
            dimension,
        }
    }
}
