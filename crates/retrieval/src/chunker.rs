//! Text chunking with configurable size and overlap.
//!
//! Sizes and offsets are counted in characters, so a window never splits a
//! UTF-8 code point. Chunk text is kept verbatim: the spans of consecutive
//! chunks tile the document exactly.

use crate::error::{RetrievalError, RetrievalResult};
use crate::types::Chunk;
use serde::{Deserialize, Serialize};

/// Chunk window configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Window length in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Characters shared by consecutive windows
    #[serde(default = "default_overlap")]
    pub overlap: usize,
}

fn default_chunk_size() -> usize {
    500
}

fn default_overlap() -> usize {
    50
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            overlap: default_overlap(),
        }
    }
}

impl ChunkingConfig {
    /// Build a config, rejecting `chunk_size == 0` and `overlap >= chunk_size`.
    pub fn new(chunk_size: usize, overlap: usize) -> RetrievalResult<Self> {
        let config = Self {
            chunk_size,
            overlap,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> RetrievalResult<()> {
        if self.chunk_size == 0 || self.overlap >= self.chunk_size {
            return Err(RetrievalError::InvalidChunking {
                chunk_size: self.chunk_size,
                overlap: self.overlap,
            });
        }
        Ok(())
    }

    /// Distance between consecutive window starts.
    pub fn step(&self) -> usize {
        self.chunk_size - self.overlap
    }
}

/// Slice `text` into overlapping windows.
///
/// Emits `[offset, offset + chunk_size)` clipped to the text and advances by
/// `chunk_size - overlap`, stopping after the window that reaches the end.
/// Text no longer than `chunk_size` is a single chunk.
pub fn chunk_text(
    document_id: &str,
    text: &str,
    config: &ChunkingConfig,
) -> RetrievalResult<Vec<Chunk>> {
    config.validate()?;

    // Byte position of every char boundary, plus the end of the text.
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_len = boundaries.len() - 1;

    let mut chunks = Vec::with_capacity(char_len.div_ceil(config.step()));
    let mut offset = 0;
    let mut sequence_index = 0u32;

    while offset < char_len {
        let end = (offset + config.chunk_size).min(char_len);

        chunks.push(Chunk {
            text: text[boundaries[offset]..boundaries[end]].to_string(),
            document_id: document_id.to_string(),
            sequence_index,
            start_offset: offset,
        });

        if end == char_len {
            break;
        }
        sequence_index += 1;
        offset += config.step();
    }

    tracing::debug!(
        document_id,
        chunks = chunks.len(),
        chunk_size = config.chunk_size,
        overlap = config.overlap,
        "Chunked document"
    );

    Ok(chunks)
}
