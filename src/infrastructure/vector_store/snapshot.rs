use serde::{Deserialize, Serialize};

use crate::domain::{ports::VectorIndex, Chunk, Document, DomainError, Embedding};

/// Serialisable form of an index. Keeps chunk offsets and vector width.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub dimension: usize,
    pub entries: Vec<SnapshotEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

/// A loaded document together with its index, as exported from a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub document: Document,
    pub index: IndexSnapshot,
}

impl IndexSnapshot {
    pub fn capture(index: &dyn VectorIndex) -> Self {
        Self {
            dimension: index.dimension().unwrap_or(0),
            entries: index
                .entries()
                .into_iter()
                .map(|(chunk, embedding)| SnapshotEntry {
                    chunk,
                    vector: embedding.0,
                })
                .collect(),
        }
    }

    /// Entries ready for [`VectorIndex::build`]. Every vector must have the
    /// recorded dimension and finite values.
    pub fn into_entries(self) -> Result<Vec<(Chunk, Embedding)>, DomainError> {
        if self.entries.is_empty() {
            return Err(DomainError::validation("snapshot has no entries"));
        }

        let dimension = self.dimension;
        self.entries
            .into_iter()
            .map(|entry| {
                if entry.vector.len() != dimension {
                    return Err(DomainError::validation(format!(
                        "snapshot chunk {} has dimension {}, expected {}",
                        entry.chunk.index,
                        entry.vector.len(),
                        dimension
                    )));
                }
                let embedding = Embedding::new(entry.vector);
                if !embedding.is_finite() {
                    return Err(DomainError::validation(format!(
                        "snapshot chunk {} has non-finite values",
                        entry.chunk.index
                    )));
                }
                Ok((entry.chunk, embedding))
            })
            .collect()
    }
}
