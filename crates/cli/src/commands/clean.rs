//! Clean command handler.

use clap::Args;
use sift_core::{config::AppConfig, AppResult};

/// Delete a corpus' persisted snapshot
#[derive(Args, Debug)]
pub struct CleanCommand {
    /// Corpus name
    pub corpus: String,
}

impl CleanCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing clean command for corpus '{}'", self.corpus);

        sift_retrieval::clean(&config.workspace, &self.corpus)?;

        println!("Corpus '{}' cleaned", self.corpus);
        Ok(())
    }
}
