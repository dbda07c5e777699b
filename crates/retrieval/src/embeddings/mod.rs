//! Embedding providers for corpora.
//!
//! Provider-agnostic embedding generation. The engine holds one provider for
//! the whole process; everything here is read-only after construction.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingConfig;
pub use provider::{create_provider, EmbeddingProvider};

use crate::error::{RetrievalError, RetrievalResult};

/// Embed a batch and check the provider kept its contract: one vector per
/// text, each of the provider's declared dimension, all components finite.
pub async fn embed_texts(
    provider: &dyn EmbeddingProvider,
    texts: &[String],
) -> RetrievalResult<Vec<Vec<f32>>> {
    if texts.is_empty() {
        return Ok(Vec::new());
    }

    let embeddings = provider.embed_batch(texts).await?;

    if embeddings.len() != texts.len() {
        return Err(RetrievalError::Embedding(format!(
            "Provider '{}' returned {} embeddings for {} texts",
            provider.provider_name(),
            embeddings.len(),
            texts.len()
        )));
    }

    if let Some(bad) = embeddings.iter().find(|e| e.len() != provider.dimensions()) {
        return Err(RetrievalError::DimensionMismatch {
            expected: provider.dimensions(),
            actual: bad.len(),
        });
    }

    if let Some(position) = embeddings
        .iter()
        .position(|e| e.iter().any(|v| !v.is_finite()))
    {
        return Err(RetrievalError::InvalidVector(format!(
            "provider '{}' returned non-finite values for text {}",
            provider.provider_name(),
            position
        )));
    }

    tracing::debug!(
        "Generated {} embeddings of dimension {} with {} ({})",
        embeddings.len(),
        provider.dimensions(),
        provider.provider_name(),
        provider.model_name()
    );

    Ok(embeddings)
}
