//! Corpus configuration management.
//!
//! Each corpus lives in `.sift/corpora/<name>/` with a `config.yaml` next to
//! its snapshot artifacts.

use crate::chunker::ChunkingConfig;
use crate::embeddings::EmbeddingConfig;
use crate::error::{RetrievalError, RetrievalResult};
use crate::snapshot::{INDEX_FILE, METADATA_FILE};
use serde::{Deserialize, Serialize};
use sift_core::config::STATE_DIR;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Query-time settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Results returned when the caller does not ask for a count
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Upper bound on the query embedding step, in seconds
    #[serde(default = "default_query_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_top_k() -> usize {
    5
}

fn default_query_timeout_secs() -> u64 {
    30
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            timeout_secs: default_query_timeout_secs(),
        }
    }
}

impl QueryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Configuration for one corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// Name of the corpus
    pub name: String,

    #[serde(default)]
    pub chunking: ChunkingConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub query: QueryConfig,
}

impl CorpusConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            chunking: ChunkingConfig::default(),
            embedding: EmbeddingConfig::default(),
            query: QueryConfig::default(),
        }
    }

    pub fn validate(&self) -> RetrievalResult<()> {
        if self.query.top_k == 0 {
            return Err(RetrievalError::Config(
                "query.top_k must be greater than zero".to_string(),
            ));
        }
        self.chunking.validate()?;
        self.embedding.validate()
    }
}

/// Load corpus configuration.
///
/// Reads `.sift/corpora/<name>/config.yaml` if it exists, otherwise returns
/// the defaults for that name.
pub fn load_config(workspace: &Path, name: &str) -> RetrievalResult<CorpusConfig> {
    let config_path = get_config_path(workspace, name);

    let config = if config_path.exists() {
        let content = fs::read_to_string(&config_path).map_err(|e| {
            RetrievalError::Config(format!("Failed to read config at {:?}: {}", config_path, e))
        })?;

        let mut config: CorpusConfig = serde_yaml::from_str(&content).map_err(|e| {
            RetrievalError::Config(format!("Failed to parse config at {:?}: {}", config_path, e))
        })?;

        // The directory name is authoritative
        config.name = name.to_string();

        tracing::debug!("Loaded corpus config for '{}'", name);
        config
    } else {
        tracing::debug!(
            "Using default corpus config for '{}' (no config file found)",
            name
        );
        CorpusConfig::new(name)
    };

    config.validate()?;
    Ok(config)
}

/// Save corpus configuration.
pub fn save_config(workspace: &Path, config: &CorpusConfig) -> RetrievalResult<()> {
    let config_path = get_config_path(workspace, &config.name);

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            RetrievalError::Config(format!("Failed to create config directory: {}", e))
        })?;
    }

    let yaml = serde_yaml::to_string(config)?;
    fs::write(&config_path, yaml).map_err(|e| {
        RetrievalError::Config(format!("Failed to write config to {:?}: {}", config_path, e))
    })?;

    tracing::debug!("Saved corpus config for '{}'", config.name);
    Ok(())
}

/// Get the directory holding a corpus' config and snapshot.
pub fn get_base_dir(workspace: &Path, name: &str) -> PathBuf {
    workspace.join(STATE_DIR).join("corpora").join(name)
}

/// Get the path to a corpus' vector index blob.
pub fn get_index_path(workspace: &Path, name: &str) -> PathBuf {
    get_base_dir(workspace, name).join(INDEX_FILE)
}

/// Get the path to a corpus' metadata record.
pub fn get_metadata_path(workspace: &Path, name: &str) -> PathBuf {
    get_base_dir(workspace, name).join(METADATA_FILE)
}

/// Get the path to a corpus' config file.
pub fn get_config_path(workspace: &Path, name: &str) -> PathBuf {
    get_base_dir(workspace, name).join("config.yaml")
}
