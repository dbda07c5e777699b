//! Retrieval error taxonomy.
//!
//! Query-time failures carry coarse, caller-safe messages; the full detail is
//! logged where the failure happens and never travels in the error value.

use sift_core::AppError;
use thiserror::Error;

/// Errors produced by the retrieval engine.
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// The embedding provider could not be initialized.
    #[error("Embedding model unavailable: {0}")]
    ModelUnavailable(String),

    /// No snapshot is published, its index is empty, or the engine is degraded.
    #[error("Search index is not ready; run ingestion first")]
    IndexUnavailable,

    /// A single document failed to fetch, extract, or embed during ingestion.
    #[error("Document '{document_id}' could not be processed: {reason}")]
    DocumentExtraction { document_id: String, reason: String },

    /// Query text was empty or whitespace only.
    #[error("Query text must not be empty")]
    EmptyQuery,

    /// Unexpected failure while answering a query. Details are only logged.
    #[error("Internal search error")]
    InternalSearch,

    /// Persisted snapshot artifacts are missing, inconsistent, or damaged.
    #[error("Corrupt snapshot: {0}")]
    CorruptSnapshot(String),

    /// Chunk size / overlap combination is unusable.
    #[error("Invalid chunking parameters: chunk_size={chunk_size}, overlap={overlap}")]
    InvalidChunking { chunk_size: usize, overlap: usize },

    /// A vector does not match the index dimension.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A vector contains NaN or infinite components.
    #[error("Invalid vector: {0}")]
    InvalidVector(String),

    /// A batch whose chunk and source (or vector) counts differ.
    #[error("Misaligned batch: {chunks} chunks but {sources} sources")]
    MisalignedBatch { chunks: usize, sources: usize },

    /// Corpus store lookup past the end.
    #[error("Chunk id {id} out of range (corpus size {size})")]
    ChunkOutOfRange { id: usize, size: usize },

    /// Embedding provider call failed.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl RetrievalError {
    /// Whether a caller may retry the same request later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::IndexUnavailable | Self::ModelUnavailable(_))
    }

    /// Transport-level status for the query surface.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::EmptyQuery | Self::InvalidChunking { .. } => 400,
            Self::IndexUnavailable | Self::ModelUnavailable(_) => 503,
            _ => 500,
        }
    }
}

impl From<serde_json::Error> for RetrievalError {
    fn from(err: serde_json::Error) -> Self {
        RetrievalError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for RetrievalError {
    fn from(err: serde_yaml::Error) -> Self {
        RetrievalError::Serialization(err.to_string())
    }
}

impl From<RetrievalError> for AppError {
    fn from(err: RetrievalError) -> Self {
        match err {
            RetrievalError::Io(e) => AppError::Io(e),
            RetrievalError::Config(msg) => AppError::Config(msg),
            RetrievalError::Serialization(msg) => AppError::Serialization(msg),
            other => AppError::Retrieval(other.to_string()),
        }
    }
}

/// Convenience type alias for Results with RetrievalError.
pub type RetrievalResult<T> = Result<T, RetrievalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_search_message_is_generic() {
        assert_eq!(RetrievalError::InternalSearch.to_string(), "Internal search error");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(RetrievalError::EmptyQuery.status_code(), 400);
        assert_eq!(RetrievalError::IndexUnavailable.status_code(), 503);
        assert_eq!(RetrievalError::InternalSearch.status_code(), 500);
        assert!(RetrievalError::IndexUnavailable.is_retryable());
        assert!(!RetrievalError::EmptyQuery.is_retryable());
    }

    #[test]
    fn test_into_app_error() {
        let err: AppError = RetrievalError::IndexUnavailable.into();
        assert!(matches!(err, AppError::Retrieval(_)));

        let err: AppError = RetrievalError::Config("bad".to_string()).into();
        assert!(matches!(err, AppError::Config(_)));
    }
}
