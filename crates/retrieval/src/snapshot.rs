//! Corpus snapshots: one immutable (index, corpus store) pair per ingestion
//! run, the cell that publishes the current one, and its on-disk artifacts.
//!
//! Readers clone the current `Arc` and release the lock immediately; the
//! writer takes the lock only to replace that `Arc`. Nothing slow ever runs
//! under the lock.

use crate::corpus::CorpusStore;
use crate::error::{RetrievalError, RetrievalResult};
use crate::types::SnapshotStats;
use crate::vector_index::VectorIndex;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Vector index blob file name.
pub const INDEX_FILE: &str = "index.bin";

/// Metadata record file name.
pub const METADATA_FILE: &str = "corpus.json";

/// Provenance of a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotInfo {
    /// Monotonic publication counter
    pub generation: u64,
    pub built_at: DateTime<Utc>,
    /// Embedding provider and model the vectors came from
    pub provider: String,
    pub model: String,
}

/// An internally consistent (index, corpus store) pair.
#[derive(Debug, Clone)]
pub struct CorpusSnapshot {
    index: VectorIndex,
    corpus: CorpusStore,
    info: SnapshotInfo,
}

impl CorpusSnapshot {
    /// Pair an index with its corpus store, enforcing equal sizes.
    pub fn new(index: VectorIndex, corpus: CorpusStore, info: SnapshotInfo) -> RetrievalResult<Self> {
        if !corpus.is_aligned() || corpus.size() != index.size() {
            return Err(RetrievalError::CorruptSnapshot(format!(
                "corpus store has {} records but index has {} vectors",
                corpus.size(),
                index.size()
            )));
        }
        Ok(Self {
            index,
            corpus,
            info,
        })
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    pub fn corpus(&self) -> &CorpusStore {
        &self.corpus
    }

    pub fn info(&self) -> &SnapshotInfo {
        &self.info
    }

    pub fn generation(&self) -> u64 {
        self.info.generation
    }

    pub fn size(&self) -> usize {
        self.index.size()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn stats(&self) -> SnapshotStats {
        SnapshotStats {
            generation: self.info.generation,
            chunks_count: self.size(),
            documents_count: self.corpus.document_count(),
            dimensions: self.index.dimensions(),
            provider: self.info.provider.clone(),
            model: self.info.model.clone(),
            built_at: self.info.built_at,
        }
    }
}

/// Holder of the currently published snapshot.
#[derive(Debug, Default)]
pub struct SnapshotCell {
    current: RwLock<Option<Arc<CorpusSnapshot>>>,
}

impl SnapshotCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// The published snapshot, if any.
    pub fn current(&self) -> Option<Arc<CorpusSnapshot>> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        guard.clone()
    }

    /// Replace the published snapshot, returning the one it superseded.
    pub fn publish(&self, snapshot: Arc<CorpusSnapshot>) -> Option<Arc<CorpusSnapshot>> {
        let generation = snapshot.generation();
        let previous = {
            let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
            guard.replace(snapshot)
        };

        tracing::info!(
            generation,
            previous = ?previous.as_ref().map(|s| s.generation()),
            "Published corpus snapshot"
        );
        previous
    }

    /// Publish `snapshot` only if it is newer than the published one.
    ///
    /// Returns `false` and leaves the cell untouched otherwise.
    pub fn publish_if_newer(&self, snapshot: Arc<CorpusSnapshot>) -> bool {
        let generation = snapshot.generation();
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        if let Some(current) = guard.as_ref() {
            if current.generation() >= generation {
                tracing::debug!(
                    generation,
                    current = current.generation(),
                    "Skipped publishing snapshot no newer than the current one"
                );
                return false;
            }
        }
        let previous = guard.replace(snapshot);
        drop(guard);

        tracing::info!(
            generation,
            previous = ?previous.as_ref().map(|s| s.generation()),
            "Published corpus snapshot"
        );
        true
    }

    /// Generation a freshly built snapshot should carry.
    pub fn next_generation(&self) -> u64 {
        self.current().map_or(1, |s| s.generation() + 1)
    }
}

/// On-disk metadata record stored next to the index blob.
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotRecord {
    #[serde(flatten)]
    corpus: CorpusStore,
    #[serde(flatten)]
    info: SnapshotInfo,
    dimensions: usize,
    index_sha256: String,
}

/// Durable storage for one corpus: `index.bin` + `corpus.json` in a directory.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn index_path(&self) -> PathBuf {
        self.dir.join(INDEX_FILE)
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.dir.join(METADATA_FILE)
    }

    /// Whether any artifact exists on disk.
    pub fn exists(&self) -> bool {
        self.index_path().exists() || self.metadata_path().exists()
    }

    /// Write both artifacts. The index goes first and the metadata record,
    /// which carries the index checksum, last.
    pub fn save(&self, snapshot: &CorpusSnapshot) -> RetrievalResult<()> {
        std::fs::create_dir_all(&self.dir)?;

        let blob = snapshot.index().to_bytes();
        let record = SnapshotRecord {
            corpus: snapshot.corpus().clone(),
            info: snapshot.info().clone(),
            dimensions: snapshot.index().dimensions(),
            index_sha256: sha256_hex(&blob),
        };
        let json = serde_json::to_vec_pretty(&record)?;

        write_atomic(&self.index_path(), &blob)?;
        write_atomic(&self.metadata_path(), &json)?;

        tracing::info!(
            generation = snapshot.generation(),
            chunks = snapshot.size(),
            "Persisted snapshot to {:?}",
            self.dir
        );
        Ok(())
    }

    /// Load the persisted snapshot.
    ///
    /// Returns `Ok(None)` when nothing was ever persisted. A lone artifact,
    /// a checksum mismatch, or a length mismatch is `CorruptSnapshot`.
    pub fn load(&self) -> RetrievalResult<Option<CorpusSnapshot>> {
        let index_path = self.index_path();
        let metadata_path = self.metadata_path();

        match (index_path.exists(), metadata_path.exists()) {
            (false, false) => return Ok(None),
            (true, false) => {
                return Err(RetrievalError::CorruptSnapshot(format!(
                    "{:?} is missing",
                    metadata_path
                )))
            }
            (false, true) => {
                return Err(RetrievalError::CorruptSnapshot(format!(
                    "{:?} is missing",
                    index_path
                )))
            }
            (true, true) => {}
        }

        let blob = std::fs::read(&index_path)?;
        let json = std::fs::read(&metadata_path)?;

        let record: SnapshotRecord = serde_json::from_slice(&json).map_err(|e| {
            RetrievalError::CorruptSnapshot(format!("unreadable metadata record: {}", e))
        })?;

        if record.index_sha256 != sha256_hex(&blob) {
            return Err(RetrievalError::CorruptSnapshot(
                "index blob does not match the checksum in the metadata record".to_string(),
            ));
        }

        let index = VectorIndex::from_bytes(&blob)?;
        if !index.is_empty() && index.dimensions() != record.dimensions {
            return Err(RetrievalError::CorruptSnapshot(format!(
                "metadata records dimension {} but index has {}",
                record.dimensions,
                index.dimensions()
            )));
        }

        let snapshot = CorpusSnapshot::new(index, record.corpus, record.info)?;
        tracing::debug!(
            generation = snapshot.generation(),
            chunks = snapshot.size(),
            "Loaded snapshot from {:?}",
            self.dir
        );
        Ok(Some(snapshot))
    }

    /// Remove both artifacts.
    pub fn clear(&self) -> RetrievalResult<()> {
        for path in [self.metadata_path(), self.index_path()] {
            if path.exists() {
                std::fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    /// Combined artifact size in bytes.
    pub fn disk_size(&self) -> u64 {
        [self.index_path(), self.metadata_path()]
            .iter()
            .filter_map(|p| std::fs::metadata(p).ok())
            .map(|m| m.len())
            .sum()
    }
}

/// Write through a temporary sibling and rename into place.
fn write_atomic(path: &Path, bytes: &[u8]) -> RetrievalResult<()> {
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}
