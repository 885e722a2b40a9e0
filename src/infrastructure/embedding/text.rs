use async_trait::async_trait;
use rig::client::EmbeddingsClient;
use rig::embeddings::EmbeddingModel;
use rig::providers::openai;
use std::time::Duration;

use crate::domain::{
    ports::{EmbeddingRequest, EmbeddingResponse, EmbeddingService},
    DomainError, Embedding,
};
use crate::infrastructure::config::EmbeddingConfig;
use crate::infrastructure::retry::with_timeout;

/// OpenAI embeddings through rig.
pub struct TextEmbedding {
    client: openai::Client,
    model: String,
    dimension: usize,
    batch_size: usize,
    timeout: Duration,
}

impl TextEmbedding {
    pub fn from_config(config: &EmbeddingConfig, api_key: &str) -> Result<Self, DomainError> {
        let client = openai::Client::builder()
            .api_key(api_key)
            .build()
            .map_err(|e| DomainError::invalid_config(format!("openai client: {e}")))?;

        Ok(Self {
            client,
            model: config.model.clone(),
            dimension: config.dimension,
            batch_size: config.batch_size.max(1),
            timeout: Duration::from_secs(config.timeout_seconds),
        })
    }

    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Embedding>, DomainError> {
        let model = self.client.embedding_model(&self.model);

        let embeddings = model
            .embed_texts(texts)
            .await
            .map_err(|e| DomainError::embedding(e.to_string()))?;

        Ok(embeddings
            .into_iter()
            .map(|emb| Embedding::new(emb.vec.into_iter().map(|x| x as f32).collect()))
            .collect())
    }
}

#[async_trait]
impl EmbeddingService for TextEmbedding {
    async fn embed_request(
        &self,
        request: EmbeddingRequest,
    ) -> Result<EmbeddingResponse, DomainError> {
        let mut vectors = Vec::with_capacity(request.inputs.len());

        for batch in request.inputs.chunks(self.batch_size) {
            let embedded = with_timeout(
                self.timeout,
                "embedding request",
                self.embed_batch(batch.to_vec()),
            )
            .await?;

            if embedded.len() != batch.len() {
                return Err(DomainError::embedding(format!(
                    "expected {} vectors, got {}",
                    batch.len(),
                    embedded.len()
                )));
            }
            vectors.extend(embedded);
        }

        tracing::debug!(count = vectors.len(), model = %self.model, "texts embedded");
        Ok(EmbeddingResponse { vectors })
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
