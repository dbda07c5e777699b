//! Semantic retrieval over private document corpora.
//!
//! Documents are chunked, embedded, and indexed into immutable snapshots.
//! Queries run against whichever snapshot is published when they start.

pub mod chunker;
pub mod config;
pub mod corpus;
pub mod embeddings;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod query;
pub mod snapshot;
pub mod source;
pub mod types;
pub mod vector_index;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use engine::RetrievalEngine;
pub use error::{RetrievalError, RetrievalResult};
pub use source::{DirectorySource, DocumentSource, PlainTextExtractor, TextExtractor};
pub use types::{
    Chunk, CorpusStats, IngestOptions, IngestStats, QueryHit, QueryOptions, SnapshotStats,
    TextDocument,
};

use snapshot::SnapshotStore;
use std::path::Path;

/// Ingest a directory into a corpus and publish the new snapshot.
///
/// Writes the corpus config with defaults the first time a corpus is used.
pub async fn ingest(workspace: &Path, options: &IngestOptions) -> RetrievalResult<IngestStats> {
    tracing::info!(
        "Starting ingestion for corpus '{}' from {:?}",
        options.corpus,
        options.path
    );

    if !config::get_config_path(workspace, &options.corpus).exists() {
        let defaults = config::load_config(workspace, &options.corpus)?;
        config::save_config(workspace, &defaults)?;
    }

    let engine = RetrievalEngine::open(workspace, &options.corpus).await?;
    let source = DirectorySource::new(&options.path)
        .with_include(options.include.clone())
        .with_exclude(options.exclude.clone());

    engine.ingest_source(&source, &PlainTextExtractor).await
}

/// Answer a query from a corpus' persisted snapshot.
pub async fn query(workspace: &Path, options: &QueryOptions) -> RetrievalResult<Vec<QueryHit>> {
    tracing::info!(
        "Querying corpus '{}' ({} chars)",
        options.corpus,
        options.query.len()
    );

    let engine = RetrievalEngine::open(workspace, &options.corpus).await?;
    let hits = engine.query(&options.query, options.k).await?;

    if let (Some(first), Some(last)) = (hits.first(), hits.last()) {
        tracing::info!(
            "Retrieved {} chunks (top similarity: {:.3}, lowest: {:.3})",
            hits.len(),
            first.similarity,
            last.similarity
        );
    }
    Ok(hits)
}

/// Describe a corpus' persisted snapshot without starting a provider.
pub fn stats(workspace: &Path, corpus: &str) -> RetrievalResult<CorpusStats> {
    tracing::info!("Getting stats for corpus '{}'", corpus);

    let store = SnapshotStore::new(config::get_base_dir(workspace, corpus));
    let snapshot = store.load()?;

    Ok(CorpusStats {
        corpus: corpus.to_string(),
        snapshot: snapshot.map(|s| s.stats()),
        disk_size_bytes: store.disk_size(),
    })
}

/// Delete a corpus' persisted snapshot. The config is kept.
pub fn clean(workspace: &Path, corpus: &str) -> RetrievalResult<()> {
    tracing::info!("Cleaning corpus '{}'", corpus);

    let store = SnapshotStore::new(config::get_base_dir(workspace, corpus));
    if !store.exists() {
        return Err(RetrievalError::Config(format!(
            "Corpus '{}' has no persisted snapshot",
            corpus
        )));
    }

    store.clear()?;
    tracing::info!("Corpus '{}' cleaned", corpus);
    Ok(())
}
