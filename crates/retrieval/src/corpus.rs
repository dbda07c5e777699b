//! Corpus store: chunk text and provenance, aligned by position with the
//! vector index ids of the same build.

use crate::error::{RetrievalError, RetrievalResult};
use crate::types::CorpusEntry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Two positionally aligned sequences indexed by vector id.
///
/// Serializes as the `{ "chunks": [...], "sources": [...] }` metadata record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusStore {
    chunks: Vec<String>,
    sources: Vec<String>,
}

impl CorpusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a batch; ids continue from the current size.
    pub fn append(&mut self, chunk_texts: Vec<String>, document_ids: Vec<String>) -> RetrievalResult<()> {
        if chunk_texts.len() != document_ids.len() {
            return Err(RetrievalError::MisalignedBatch {
                chunks: chunk_texts.len(),
                sources: document_ids.len(),
            });
        }
        self.chunks.extend(chunk_texts);
        self.sources.extend(document_ids);
        Ok(())
    }

    /// Resolve a vector id to its chunk text and document.
    pub fn get(&self, id: usize) -> RetrievalResult<CorpusEntry> {
        match (self.chunks.get(id), self.sources.get(id)) {
            (Some(text), Some(document_id)) => Ok(CorpusEntry {
                text: text.clone(),
                document_id: document_id.clone(),
            }),
            _ => Err(RetrievalError::ChunkOutOfRange {
                id,
                size: self.size(),
            }),
        }
    }

    pub fn size(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Number of distinct source documents.
    pub fn document_count(&self) -> usize {
        self.sources.iter().collect::<BTreeSet<_>>().len()
    }

    /// Check the alignment invariant after deserialization.
    pub fn is_aligned(&self) -> bool {
        self.chunks.len() == self.sources.len()
    }
}
