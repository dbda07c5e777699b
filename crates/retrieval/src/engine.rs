//! Retrieval engine: the application context for one corpus.
//!
//! Owns the embedding provider (or the reason there is none), the published
//! snapshot, the optional on-disk store, and the lock that serializes
//! ingestion runs. Queries never wait on ingestion.

use crate::config::{get_base_dir, load_config, CorpusConfig};
use crate::embeddings::{create_provider, EmbeddingConfig, EmbeddingProvider};
use crate::error::{RetrievalError, RetrievalResult};
use crate::ingest::{IngestInput, IngestionPipeline};
use crate::query::{validate_query, QueryEngine};
use crate::snapshot::{CorpusSnapshot, SnapshotCell, SnapshotStore};
use crate::source::{DocumentSource, TextExtractor};
use crate::types::{IngestStats, QueryHit, SnapshotStats, TextDocument};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug)]
pub struct RetrievalEngine {
    config: CorpusConfig,
    query_engine: Option<QueryEngine>,
    provider: Option<Arc<dyn EmbeddingProvider>>,
    degraded_reason: Option<String>,
    snapshots: SnapshotCell,
    store: Option<SnapshotStore>,
    ingest_lock: Mutex<()>,
}

impl RetrievalEngine {
    /// Open a corpus in a workspace: its config and persisted snapshot.
    pub async fn open(workspace: &Path, name: &str) -> RetrievalResult<Self> {
        let config = load_config(workspace, name)?;
        let store = SnapshotStore::new(get_base_dir(workspace, name));
        Self::start(config, Some(store)).await
    }

    /// Build the provider from config and restore the persisted snapshot.
    ///
    /// A provider that fails to initialize does not fail startup: the engine
    /// comes up degraded and refuses ingestion and queries until restarted.
    pub async fn start(config: CorpusConfig, store: Option<SnapshotStore>) -> RetrievalResult<Self> {
        config.validate()?;

        match create_provider(&config.embedding).await {
            Ok(provider) => Ok(Self::with_provider(config, provider, store)),
            Err(e) => {
                let reason = e.to_string();
                tracing::error!(
                    corpus = %config.name,
                    provider = %config.embedding.provider,
                    "{}",
                    RetrievalError::ModelUnavailable(reason.clone())
                );
                Ok(Self::assemble(config, None, Some(reason), store))
            }
        }
    }

    /// Use an already constructed provider.
    pub fn with_provider(
        config: CorpusConfig,
        provider: Arc<dyn EmbeddingProvider>,
        store: Option<SnapshotStore>,
    ) -> Self {
        Self::assemble(config, Some(provider), None, store)
    }

    fn assemble(
        config: CorpusConfig,
        provider: Option<Arc<dyn EmbeddingProvider>>,
        degraded_reason: Option<String>,
        store: Option<SnapshotStore>,
    ) -> Self {
        let query_engine = provider
            .as_ref()
            .map(|p| QueryEngine::new(Arc::clone(p), config.query.timeout()));

        let engine = Self {
            config,
            query_engine,
            provider,
            degraded_reason,
            snapshots: SnapshotCell::new(),
            store,
            ingest_lock: Mutex::new(()),
        };

        // Failures are already logged; the engine starts with no snapshot.
        let _ = engine.reload();
        engine
    }

    pub fn config(&self) -> &CorpusConfig {
        &self.config
    }

    pub fn store(&self) -> Option<&SnapshotStore> {
        self.store.as_ref()
    }

    pub fn provider(&self) -> Option<&Arc<dyn EmbeddingProvider>> {
        self.provider.as_ref()
    }

    pub fn is_degraded(&self) -> bool {
        self.provider.is_none()
    }

    /// The currently published snapshot.
    pub fn current_snapshot(&self) -> Option<Arc<CorpusSnapshot>> {
        self.snapshots.current()
    }

    /// Summary of the published snapshot, if there is one.
    pub fn stats(&self) -> Option<SnapshotStats> {
        self.snapshots.current().map(|s| s.stats())
    }

    /// Publish the persisted snapshot from the store.
    ///
    /// Returns `Ok(true)` when a snapshot was published. A corrupt or
    /// incompatible snapshot is reported and the current one stays published,
    /// as does a newer in-memory snapshot.
    pub fn reload(&self) -> RetrievalResult<bool> {
        let Some(store) = &self.store else {
            return Ok(false);
        };

        let snapshot = match store.load() {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                tracing::debug!("No persisted snapshot for corpus '{}'", self.config.name);
                return Ok(false);
            }
            Err(e) => {
                tracing::error!(
                    corpus = %self.config.name,
                    "Failed to load persisted snapshot, keeping current one: {}",
                    e
                );
                return Err(e);
            }
        };

        if let Some(provider) = &self.provider {
            if let Err(e) = check_compatible(provider.as_ref(), &self.config.embedding, &snapshot) {
                tracing::warn!(
                    corpus = %self.config.name,
                    "Persisted snapshot was built with a different embedding model, re-run ingestion: {}",
                    e
                );
                return Err(e);
            }
        }

        Ok(self.snapshots.publish_if_newer(Arc::new(snapshot)))
    }

    /// Ingest already extracted documents and publish the result.
    pub async fn ingest(&self, documents: Vec<TextDocument>) -> RetrievalResult<IngestStats> {
        self.run_ingest(IngestInput::Documents(documents)).await
    }

    /// Ingest every document a source lists, extracting each one.
    pub async fn ingest_source(
        &self,
        source: &dyn DocumentSource,
        extractor: &dyn TextExtractor,
    ) -> RetrievalResult<IngestStats> {
        self.run_ingest(IngestInput::Source { source, extractor }).await
    }

    async fn run_ingest(&self, input: IngestInput<'_>) -> RetrievalResult<IngestStats> {
        let Some(provider) = &self.provider else {
            return Err(RetrievalError::ModelUnavailable(
                self.degraded_reason
                    .clone()
                    .unwrap_or_else(|| "no embedding provider".to_string()),
            ));
        };

        let _guard = self.ingest_lock.lock().await;

        let pipeline = IngestionPipeline::new(Arc::clone(provider), self.config.chunking)?;
        let generation = self.snapshots.next_generation();
        let (snapshot, stats) = pipeline.run(input, generation).await?;
        let snapshot = Arc::new(snapshot);

        if let Some(store) = &self.store {
            let store = store.clone();
            let to_save = Arc::clone(&snapshot);
            let saved = tokio::task::spawn_blocking(move || store.save(&to_save))
                .await
                .map_err(|e| RetrievalError::Io(std::io::Error::other(e)))
                .and_then(|result| result);

            if let Err(e) = saved {
                tracing::error!(
                    corpus = %self.config.name,
                    generation,
                    "Failed to persist snapshot, previous snapshot stays published: {}",
                    e
                );
                return Err(e);
            }
        }

        self.snapshots.publish(snapshot);
        Ok(stats)
    }

    /// Ranked chunks for `text`. `k` defaults to the configured `top_k`.
    pub async fn query(&self, text: &str, k: Option<usize>) -> RetrievalResult<Vec<QueryHit>> {
        validate_query(text)?;

        let Some(query_engine) = &self.query_engine else {
            tracing::debug!("Query refused, engine is degraded");
            return Err(RetrievalError::IndexUnavailable);
        };

        let k = k.unwrap_or(self.config.query.top_k);
        query_engine.query(self.snapshots.current(), text, k).await
    }
}

/// A snapshot is only usable with the provider that produced its vectors.
fn check_compatible(
    provider: &dyn EmbeddingProvider,
    config: &EmbeddingConfig,
    snapshot: &CorpusSnapshot,
) -> RetrievalResult<()> {
    if snapshot.is_empty() {
        return Ok(());
    }

    let active = EmbeddingConfig {
        provider: provider.provider_name().to_string(),
        model: provider.model_name().to_string(),
        dimensions: provider.dimensions(),
        ..config.clone()
    };
    let info = snapshot.info();
    active.validate_consistency(&info.provider, &info.model, snapshot.index().dimensions())
}
