use crate::domain::{ports::VectorIndex, Chunk, DomainError, Embedding, SearchResult};

/// Exhaustive cosine scan. Vectors are stored unit-normalised so scoring a
/// query is one dot product per entry.
#[derive(Debug, Default)]
pub struct InMemoryVectorIndex {
    entries: Vec<(Chunk, Embedding)>,
    dimension: Option<usize>,
}

impl InMemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VectorIndex for InMemoryVectorIndex {
    fn build(&mut self, entries: Vec<(Chunk, Embedding)>) -> Result<(), DomainError> {
        let dimension = entries.first().map(|(_, e)| e.dimension());

        if let Some(dim) = dimension {
            if dim == 0 {
                return Err(DomainError::validation("embeddings must not be empty"));
            }
            if let Some((chunk, _)) = entries.iter().find(|(_, e)| !e.is_finite()) {
                return Err(DomainError::validation(format!(
                    "chunk {} has a non-finite embedding",
                    chunk.index
                )));
            }
            if let Some((chunk, e)) = entries.iter().find(|(_, e)| e.dimension() != dim) {
                return Err(DomainError::validation(format!(
                    "chunk {} has dimension {}, expected {}",
                    chunk.index,
                    e.dimension(),
                    dim
                )));
            }
        }

        self.entries = entries
            .into_iter()
            .map(|(chunk, embedding)| (chunk, embedding.normalized()))
            .collect();
        self.dimension = dimension;

        tracing::debug!(entries = self.entries.len(), ?dimension, "vector index built");
        Ok(())
    }

    fn search(&self, query: &Embedding, k: usize) -> Result<Vec<SearchResult>, DomainError> {
        let dimension = match self.dimension {
            Some(d) if !self.entries.is_empty() => d,
            _ => return Err(DomainError::EmptyIndex),
        };

        if query.dimension() != dimension {
            return Err(DomainError::validation(format!(
                "query has dimension {}, index has {}",
                query.dimension(),
                dimension
            )));
        }

        if !query.is_finite() {
            return Err(DomainError::validation("query embedding has non-finite values"));
        }

        let query = query.normalized();
        let mut results: Vec<SearchResult> = self
            .entries
            .iter()
            .map(|(chunk, embedding)| SearchResult {
                chunk: chunk.clone(),
                score: query.dot(embedding),
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then(a.chunk.index.cmp(&b.chunk.index))
        });
        results.truncate(k);

        Ok(results)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    fn entries(&self) -> Vec<(Chunk, Embedding)> {
        self.entries.clone()
    }
}
