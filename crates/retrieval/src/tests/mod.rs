//! Engine-level scenario tests and the stub providers they share.

mod ranking;

use crate::config::CorpusConfig;
use crate::embeddings::EmbeddingProvider;
use crate::error::RetrievalResult;
use crate::types::TextDocument;
use async_trait::async_trait;
use std::time::Duration;

const KEYWORDS: &[&str] = &["licens", "regulat", "law", "bread", "recipe", "flour"];

/// One axis per keyword stem; counts stem occurrences.
#[derive(Debug)]
pub(crate) struct KeywordProvider;

impl KeywordProvider {
    fn embed_one(text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        KEYWORDS
            .iter()
            .map(|stem| lower.matches(stem).count() as f32)
            .collect()
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordProvider {
    fn provider_name(&self) -> &str {
        "keyword"
    }

    fn model_name(&self) -> &str {
        "keyword-v1"
    }

    fn dimensions(&self) -> usize {
        KEYWORDS.len()
    }

    async fn embed_batch(&self, texts: &[String]) -> RetrievalResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| Self::embed_one(t)).collect())
    }
}

/// Keyword provider that hangs on any text containing "stall".
#[derive(Debug)]
pub(crate) struct StallingProvider {
    pub delay: Duration,
}

#[async_trait]
impl EmbeddingProvider for StallingProvider {
    fn provider_name(&self) -> &str {
        "keyword"
    }

    fn model_name(&self) -> &str {
        "keyword-v1"
    }

    fn dimensions(&self) -> usize {
        KEYWORDS.len()
    }

    async fn embed_batch(&self, texts: &[String]) -> RetrievalResult<Vec<Vec<f32>>> {
        if texts.iter().any(|t| t.contains("stall")) {
            tokio::time::sleep(self.delay).await;
        }
        KeywordProvider.embed_batch(texts).await
    }
}

pub(crate) fn test_config() -> CorpusConfig {
    let mut config = CorpusConfig::new("test-corpus");
    config.query.timeout_secs = 1;
    config
}

pub(crate) fn legal_and_baking() -> Vec<TextDocument> {
    vec![
        TextDocument::new("bread.txt", "Recipe for bread: mix flour, water, and yeast."),
        TextDocument::new("law.txt", "Licensing law overview for small businesses."),
    ]
}
