use async_trait::async_trait;

use crate::domain::{
    ports::{EmbeddingRequest, EmbeddingResponse, EmbeddingService},
    DomainError, Embedding,
};

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Bag-of-words feature hashing. Runs offline and is fully deterministic:
/// texts sharing words get similar vectors, nothing more.
#[derive(Debug, Clone)]
pub struct HashingEmbedding {
    dimension: usize,
}

impl HashingEmbedding {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    pub fn embed_text(&self, text: &str) -> Embedding {
        let mut vec = vec![0.0f32; self.dimension];
        for token in tokenize(text) {
            let slot = (fnv1a(token.as_bytes()) % self.dimension as u64) as usize;
            vec[slot] += 1.0;
        }
        Embedding::new(vec)
    }
}

impl Default for HashingEmbedding {
    fn default() -> Self {
        Self::new(512)
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(FNV_OFFSET, |hash, b| (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME))
}

#[async_trait]
impl EmbeddingService for HashingEmbedding {
    async fn embed_request(
        &self,
        request: EmbeddingRequest,
    ) -> Result<EmbeddingResponse, DomainError> {
        Ok(EmbeddingResponse {
            vectors: request.inputs.iter().map(|t| self.embed_text(t)).collect(),
        })
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
