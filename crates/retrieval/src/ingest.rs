//! Ingestion pipeline: documents → chunks → embeddings → new snapshot.
//!
//! Each document is processed on its own. A document that cannot be fetched,
//! extracted, chunked, or embedded is logged and skipped; the run goes on and
//! completes even if nothing survives.

use crate::chunker::{chunk_text, ChunkingConfig};
use crate::corpus::CorpusStore;
use crate::embeddings::{embed_texts, EmbeddingProvider};
use crate::error::{RetrievalError, RetrievalResult};
use crate::snapshot::{CorpusSnapshot, SnapshotInfo};
use crate::source::{DocumentSource, TextExtractor};
use crate::types::{Chunk, IngestStats, TextDocument};
use crate::vector_index::VectorIndex;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;

/// Documents fetched and extracted ahead of the embedding step.
const FETCH_CONCURRENCY: usize = 8;

/// What a run ingests.
pub enum IngestInput<'a> {
    /// Documents whose text is already extracted
    Documents(Vec<TextDocument>),

    /// Documents fetched and extracted one at a time during the run
    Source {
        source: &'a dyn DocumentSource,
        extractor: &'a dyn TextExtractor,
    },
}

/// Builds a complete snapshot off to the side. Publishing is the caller's job.
#[derive(Debug, Clone)]
pub struct IngestionPipeline {
    provider: Arc<dyn EmbeddingProvider>,
    chunking: ChunkingConfig,
}

impl IngestionPipeline {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, chunking: ChunkingConfig) -> RetrievalResult<Self> {
        chunking.validate()?;
        Ok(Self { provider, chunking })
    }

    /// Run one ingestion and return the unpublished snapshot.
    ///
    /// Ids are assigned in document order, then chunk order, so the same
    /// input always yields the same ids.
    pub async fn run(
        &self,
        input: IngestInput<'_>,
        generation: u64,
    ) -> RetrievalResult<(CorpusSnapshot, IngestStats)> {
        let start = Instant::now();
        let mut builder = SnapshotBuilder::default();

        match input {
            IngestInput::Documents(documents) => {
                tracing::info!("Ingesting {} documents", documents.len());
                for document in documents {
                    self.ingest_document(&mut builder, document).await;
                }
            }
            IngestInput::Source { source, extractor } => {
                let ids = source.list().await?;
                tracing::info!("Ingesting {} documents from source", ids.len());

                // Reads overlap; `buffered` still yields documents in list order.
                let mut fetched = stream::iter(ids)
                    .map(|document_id| async move {
                        let text = fetch_and_extract(source, extractor, &document_id).await;
                        (document_id, text)
                    })
                    .buffered(FETCH_CONCURRENCY);

                while let Some((document_id, text)) = fetched.next().await {
                    match text {
                        Ok(text) => {
                            self.ingest_document(&mut builder, TextDocument::new(document_id, text))
                                .await
                        }
                        Err(e) => builder.record_failure(&document_id, e),
                    }
                }
            }
        }

        let info = SnapshotInfo {
            generation,
            built_at: Utc::now(),
            provider: self.provider.provider_name().to_string(),
            model: self.provider.model_name().to_string(),
        };
        let (snapshot, mut stats) = builder.finish(info)?;
        stats.duration_secs = start.elapsed().as_secs_f64();

        tracing::info!(
            "Ingestion built generation {}: {} documents indexed, {} failed, {} chunks in {:.2}s",
            generation,
            stats.documents_indexed,
            stats.documents_failed,
            stats.chunks_indexed,
            stats.duration_secs
        );

        Ok((snapshot, stats))
    }

    async fn ingest_document(&self, builder: &mut SnapshotBuilder, document: TextDocument) {
        let embedded = self.embed_document(&document).await;
        let pushed = embedded.and_then(|(chunks, vectors)| {
            let count = chunks.len();
            builder.push(chunks, vectors, document.text.len() as u64)?;
            Ok(count)
        });

        match pushed {
            Ok(count) => {
                tracing::debug!(
                    document_id = %document.document_id,
                    chunks = count,
                    "Indexed document"
                );
            }
            Err(e) => builder.record_failure(&document.document_id, e),
        }
    }

    async fn embed_document(
        &self,
        document: &TextDocument,
    ) -> RetrievalResult<(Vec<Chunk>, Vec<Vec<f32>>)> {
        let chunks = chunk_text(&document.document_id, &document.text, &self.chunking)?;
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = embed_texts(self.provider.as_ref(), &texts).await?;
        Ok((chunks, vectors))
    }
}

async fn fetch_and_extract(
    source: &dyn DocumentSource,
    extractor: &dyn TextExtractor,
    document_id: &str,
) -> RetrievalResult<String> {
    let bytes = source.fetch(document_id).await?;
    extractor.extract(document_id, &bytes)
}

#[derive(Default)]
struct SnapshotBuilder {
    vectors: Vec<Vec<f32>>,
    corpus: CorpusStore,
    stats: IngestStats,
}

impl SnapshotBuilder {
    /// Add one document's chunks and vectors. Nothing is added on error.
    fn push(&mut self, chunks: Vec<Chunk>, vectors: Vec<Vec<f32>>, bytes: u64) -> RetrievalResult<()> {
        if chunks.len() != vectors.len() {
            return Err(RetrievalError::MisalignedBatch {
                chunks: chunks.len(),
                sources: vectors.len(),
            });
        }

        let count = chunks.len();
        let (texts, sources): (Vec<String>, Vec<String>) = chunks
            .into_iter()
            .map(|chunk| (chunk.text, chunk.document_id))
            .unzip();
        self.corpus.append(texts, sources)?;
        self.vectors.extend(vectors);

        self.stats.documents_seen += 1;
        self.stats.documents_indexed += 1;
        self.stats.chunks_indexed += count;
        self.stats.bytes_processed += bytes;
        Ok(())
    }

    fn record_failure(&mut self, document_id: &str, error: RetrievalError) {
        self.stats.documents_seen += 1;
        self.stats.documents_failed += 1;

        let error = match error {
            e @ RetrievalError::DocumentExtraction { .. } => e,
            other => RetrievalError::DocumentExtraction {
                document_id: document_id.to_string(),
                reason: other.to_string(),
            },
        };
        tracing::warn!(document_id, "Skipping document: {}", error);
    }

    fn finish(self, info: SnapshotInfo) -> RetrievalResult<(CorpusSnapshot, IngestStats)> {
        let index = VectorIndex::build(&self.vectors)?;
        let snapshot = CorpusSnapshot::new(index, self.corpus, info)?;

        let mut stats = self.stats;
        stats.generation = snapshot.generation();
        Ok((snapshot, stats))
    }
}
