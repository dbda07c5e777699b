//! Query engine: text → embedding → nearest chunks.
//!
//! Callers only ever see coarse errors. Anything that goes wrong after the
//! input checks is logged here with full context and surfaced as
//! `InternalSearch`.

use crate::embeddings::{embed_texts, EmbeddingProvider};
use crate::error::{RetrievalError, RetrievalResult};
use crate::snapshot::CorpusSnapshot;
use crate::types::QueryHit;
use std::sync::Arc;
use std::time::Duration;

/// Reject blank query text before any work is done.
pub fn validate_query(text: &str) -> RetrievalResult<()> {
    if text.trim().is_empty() {
        return Err(RetrievalError::EmptyQuery);
    }
    Ok(())
}

/// Answers queries against whatever snapshot it is handed.
#[derive(Debug, Clone)]
pub struct QueryEngine {
    provider: Arc<dyn EmbeddingProvider>,
    timeout: Duration,
}

impl QueryEngine {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    /// Top `k` chunks for `text`, most similar first.
    ///
    /// `snapshot` is the caller's clone of the published snapshot; a swap that
    /// happens while this runs does not affect the answer.
    pub async fn query(
        &self,
        snapshot: Option<Arc<CorpusSnapshot>>,
        text: &str,
        k: usize,
    ) -> RetrievalResult<Vec<QueryHit>> {
        validate_query(text)?;

        let snapshot = match snapshot {
            Some(snapshot) if !snapshot.is_empty() => snapshot,
            _ => return Err(RetrievalError::IndexUnavailable),
        };

        self.search(&snapshot, text, k).await.map_err(|e| {
            tracing::error!(
                query_len = text.len(),
                k,
                generation = snapshot.generation(),
                provider = self.provider.provider_name(),
                "Query failed: {}",
                e
            );
            RetrievalError::InternalSearch
        })
    }

    async fn search(
        &self,
        snapshot: &CorpusSnapshot,
        text: &str,
        k: usize,
    ) -> RetrievalResult<Vec<QueryHit>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let query_vector = self.embed_query(text).await?;
        let hits = snapshot.index().search(&query_vector, k)?;

        let results = hits
            .into_iter()
            .map(|hit| {
                let entry = snapshot.corpus().get(hit.id)?;
                Ok(QueryHit {
                    chunk_text: entry.text,
                    document_id: entry.document_id,
                    similarity: hit.similarity,
                })
            })
            .collect::<RetrievalResult<Vec<_>>>()?;

        tracing::debug!(
            generation = snapshot.generation(),
            "Query returned {} hits",
            results.len()
        );
        Ok(results)
    }

    async fn embed_query(&self, text: &str) -> RetrievalResult<Vec<f32>> {
        let texts = [text.to_string()];
        let embedding = tokio::time::timeout(self.timeout, embed_texts(self.provider.as_ref(), &texts))
            .await
            .map_err(|_| {
                RetrievalError::Embedding(format!(
                    "query embedding timed out after {:?}",
                    self.timeout
                ))
            })??;

        embedding
            .into_iter()
            .next()
            .ok_or_else(|| RetrievalError::Embedding("provider returned no embedding".to_string()))
    }
}
