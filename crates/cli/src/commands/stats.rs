//! Stats command handler.

use clap::Args;
use sift_core::{config::AppConfig, AppResult};

/// Show corpus snapshot statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Corpus name
    pub corpus: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing stats command for corpus '{}'", self.corpus);

        let stats = sift_retrieval::stats(&config.workspace, &self.corpus)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
            return Ok(());
        }

        println!("Corpus: {}", stats.corpus);
        match &stats.snapshot {
            Some(snapshot) => {
                println!("  Generation: {}", snapshot.generation);
                println!("  Documents: {}", snapshot.documents_count);
                println!("  Chunks: {}", snapshot.chunks_count);
                println!("  Dimensions: {}", snapshot.dimensions);
                println!("  Model: {} ({})", snapshot.model, snapshot.provider);
                println!("  Built: {}", snapshot.built_at);
            }
            None => println!("  No snapshot yet. Run 'sift ingest {}' first.", stats.corpus),
        }
        println!("  Disk size: {} bytes", stats.disk_size_bytes);

        Ok(())
    }
}
