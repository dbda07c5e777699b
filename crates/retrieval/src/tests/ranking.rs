//! Tests for ranking correctness through the full engine.

use super::{legal_and_baking, test_config, KeywordProvider};
use crate::engine::RetrievalEngine;
use crate::types::TextDocument;
use std::sync::Arc;

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> RetrievalEngine {
        RetrievalEngine::with_provider(test_config(), Arc::new(KeywordProvider), None)
    }

    #[tokio::test]
    async fn test_licensing_query_ranks_legal_chunk_first() {
        let engine = engine();
        engine.ingest(legal_and_baking()).await.unwrap();

        let hits = engine.query("licensing regulations", Some(2)).await.unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(
            hits[0].document_id, "law.txt",
            "Licensing chunk should be first"
        );
        assert_eq!(hits[0].chunk_text, "Licensing law overview for small businesses.");
        assert!(
            hits[0].similarity > hits[1].similarity,
            "Scores should be ordered: {} > {}",
            hits[0].similarity,
            hits[1].similarity
        );
        assert!(
            hits[1].similarity.abs() < 1e-6,
            "Unrelated chunk should be orthogonal: {}",
            hits[1].similarity
        );
    }

    #[tokio::test]
    async fn test_default_k_comes_from_config() {
        let engine = engine();
        let documents = (0..8)
            .map(|i| TextDocument::new(format!("doc-{}.txt", i), format!("bread recipe number {}", i)))
            .collect();
        engine.ingest(documents).await.unwrap();

        let hits = engine.query("bread", None).await.unwrap();
        assert_eq!(hits.len(), engine.config().query.top_k);
    }

    #[tokio::test]
    async fn test_k_larger_than_corpus_returns_everything_once() {
        let engine = engine();
        engine.ingest(legal_and_baking()).await.unwrap();

        let hits = engine.query("flour", Some(50)).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_ne!(hits[0].document_id, hits[1].document_id);
    }

    #[tokio::test]
    async fn test_equal_scores_keep_ingestion_order() {
        let engine = engine();
        let documents = vec![
            TextDocument::new("first.txt", "bread"),
            TextDocument::new("second.txt", "bread"),
            TextDocument::new("third.txt", "bread"),
        ];
        engine.ingest(documents).await.unwrap();

        let hits = engine.query("bread", Some(3)).await.unwrap();
        let order: Vec<&str> = hits.iter().map(|h| h.document_id.as_str()).collect();
        assert_eq!(order, vec!["first.txt", "second.txt", "third.txt"]);
    }

    #[tokio::test]
    async fn test_same_input_same_results() {
        let first = engine();
        let second = engine();
        first.ingest(legal_and_baking()).await.unwrap();
        second.ingest(legal_and_baking()).await.unwrap();

        let a = first.current_snapshot().unwrap();
        let b = second.current_snapshot().unwrap();
        assert_eq!(a.corpus(), b.corpus());

        let hits_a = first.query("bread law", Some(2)).await.unwrap();
        let hits_b = second.query("bread law", Some(2)).await.unwrap();
        assert_eq!(hits_a, hits_b);
    }
}
