use crate::domain::{errors::DomainError, Embedding};
use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct EmbeddingRequest {
    pub inputs: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct EmbeddingResponse {
    pub vectors: Vec<Embedding>,
}

/// Text to vector boundary. Implementations answer one request with one
/// vector per input, in input order.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    async fn embed_request(
        &self,
        request: EmbeddingRequest,
    ) -> Result<EmbeddingResponse, DomainError>;

    fn dimension(&self) -> usize;

    async fn embed(&self, text: &str) -> Result<Embedding, DomainError> {
        self.embed_many(&[text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| DomainError::embedding("No embedding returned"))
    }

    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Embedding>, DomainError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .embed_request(EmbeddingRequest {
                inputs: texts.to_vec(),
            })
            .await?;

        if response.vectors.len() != texts.len() {
            return Err(DomainError::embedding(format!(
                "expected {} vectors, got {}",
                texts.len(),
                response.vectors.len()
            )));
        }

        if let Some(position) = response.vectors.iter().position(|v| !v.is_finite()) {
            return Err(DomainError::embedding(format!(
                "vector {position} contains non-finite values"
            )));
        }

        Ok(response.vectors)
    }
}
