//! Ingest command handler.
//!
//! Builds a new snapshot of a corpus from a directory of text files.

use clap::Args;
use sift_core::{config::AppConfig, AppResult};
use sift_retrieval::IngestOptions;
use std::path::PathBuf;

/// Ingest a directory into a corpus
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// Corpus name
    pub corpus: String,

    /// Directory to ingest
    #[arg(long)]
    pub path: PathBuf,

    /// Only ingest paths containing one of these substrings
    #[arg(long)]
    pub include: Vec<String>,

    /// Skip paths containing any of these substrings
    #[arg(long)]
    pub exclude: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IngestCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ingest command for corpus '{}'", self.corpus);

        let options = IngestOptions {
            corpus: self.corpus.clone(),
            path: self.path.clone(),
            include: self.include.clone(),
            exclude: self.exclude.clone(),
        };

        let stats = sift_retrieval::ingest(&config.workspace, &options).await?;

        if self.json {
            let output = serde_json::json!({
                "corpus": self.corpus,
                "generation": stats.generation,
                "documentsSeen": stats.documents_seen,
                "documentsIndexed": stats.documents_indexed,
                "documentsFailed": stats.documents_failed,
                "chunksIndexed": stats.chunks_indexed,
                "bytesProcessed": stats.bytes_processed,
                "durationSecs": stats.duration_secs,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!(
                "Indexed {} documents ({} chunks, {} bytes) in {:.2}s, generation {}",
                stats.documents_indexed,
                stats.chunks_indexed,
                stats.bytes_processed,
                stats.duration_secs,
                stats.generation
            );
            if stats.documents_failed > 0 {
                println!(
                    "Skipped {} documents that could not be processed (see log)",
                    stats.documents_failed
                );
            }
        }

        Ok(())
    }
}
