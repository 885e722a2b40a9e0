use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::{DomainError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub source: String,
    pub content: String,
    pub loaded_at: DateTime<Utc>,
}

impl Document {
    pub fn new(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: source.into(),
            content: content.into(),
            loaded_at: Utc::now(),
        }
    }

    /// Length in chars, the unit chunk offsets are measured in.
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

/// A window of a document. `start` and `end` are char offsets, end exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub index: usize,
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl Chunk {
    pub fn char_len(&self) -> usize {
        self.end - self.start
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub chunk: Chunk,
    pub score: f32,
}

pub fn validate_chunking(chunk_size: usize, overlap: usize) -> Result<()> {
    if chunk_size == 0 {
        return Err(DomainError::invalid_config("chunk_size must be greater than 0"));
    }
    if overlap == 0 {
        return Err(DomainError::invalid_config("chunk_overlap must be greater than 0"));
    }
    if overlap >= chunk_size {
        return Err(DomainError::invalid_config(format!(
            "chunk_overlap ({overlap}) must be smaller than chunk_size ({chunk_size})"
        )));
    }
    Ok(())
}

/// Splits text into fixed windows of `chunk_size` chars.
///
/// Each window starts `chunk_size - overlap` chars after the previous one, so
/// neighbours share `overlap` chars. The final window may be shorter but is
/// never empty; empty text produces no chunks. Offsets count chars rather than
/// bytes so multi-byte text is never split inside a code point.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<Chunk>> {
    validate_chunking(chunk_size, overlap)?;

    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let len = boundaries.len() - 1;
    let step = chunk_size - overlap;

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < len {
        let end = (start + chunk_size).min(len);
        chunks.push(Chunk {
            index: chunks.len(),
            start,
            end,
            text: text[boundaries[start]..boundaries[end]].to_string(),
        });

        if end == len {
            break;
        }
        start += step;
    }

    Ok(chunks)
}
