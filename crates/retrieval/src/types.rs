//! Retrieval type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A bounded, ordered slice of one document's text.
///
/// Only the chunker creates these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Chunk text, exactly the characters of its span
    pub text: String,

    /// Source document identifier
    pub document_id: String,

    /// Position within the source document (0-based, gapless)
    pub sequence_index: u32,

    /// Character offset of the first character within the document
    pub start_offset: usize,
}

impl Chunk {
    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// An already text-extracted document handed to ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextDocument {
    pub document_id: String,
    pub text: String,
}

impl TextDocument {
    pub fn new(document_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            text: text.into(),
        }
    }
}

/// A corpus store record resolved from a vector id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusEntry {
    pub text: String,
    pub document_id: String,
}

/// One ranked query result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryHit {
    /// Matched chunk text
    pub chunk_text: String,

    /// Document the chunk came from
    pub document_id: String,

    /// Cosine similarity to the query (higher is better)
    pub similarity: f32,
}

/// Statistics from an ingestion run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestStats {
    /// Documents offered to the run
    pub documents_seen: usize,

    /// Documents whose chunks made it into the snapshot
    pub documents_indexed: usize,

    /// Documents skipped after a fetch, extraction, or embedding failure
    pub documents_failed: usize,

    /// Chunks in the published snapshot
    pub chunks_indexed: usize,

    /// Bytes of extracted text processed
    pub bytes_processed: u64,

    /// Duration in seconds
    pub duration_secs: f64,

    /// Generation number of the published snapshot
    pub generation: u64,
}

/// Summary of the currently published snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotStats {
    pub generation: u64,
    pub chunks_count: usize,
    pub documents_count: usize,
    pub dimensions: usize,
    pub provider: String,
    pub model: String,
    pub built_at: DateTime<Utc>,
}

/// Options for ingesting a directory into a corpus.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Corpus name
    pub corpus: String,

    /// Directory to read documents from
    pub path: PathBuf,

    /// Keep only paths containing one of these substrings
    pub include: Vec<String>,

    /// Drop paths containing any of these substrings
    pub exclude: Vec<String>,
}

/// Options for querying a corpus.
#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// Corpus name
    pub corpus: String,

    /// Query text
    pub query: String,

    /// Number of hits; the corpus `top_k` when absent
    pub k: Option<usize>,
}

/// What `stats` reports about a corpus on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusStats {
    pub corpus: String,

    /// Persisted snapshot summary, if one exists
    pub snapshot: Option<SnapshotStats>,

    /// Combined size of the snapshot artifacts in bytes
    pub disk_size_bytes: u64,
}
