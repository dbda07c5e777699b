//! Query command handler.

use clap::Args;
use sift_core::{config::AppConfig, AppResult};
use sift_retrieval::QueryOptions;

/// Query a corpus
#[derive(Args, Debug)]
pub struct QueryCommand {
    /// Corpus name
    pub corpus: String,

    /// Query text
    pub query: String,

    /// Number of chunks to return (default: the corpus top_k)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl QueryCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing query command for corpus '{}'", self.corpus);

        let options = QueryOptions {
            corpus: self.corpus.clone(),
            query: self.query.clone(),
            k: self.top_k,
        };

        let hits = match sift_retrieval::query(&config.workspace, &options).await {
            Ok(hits) => hits,
            Err(e) => {
                if self.json {
                    let output = serde_json::json!({
                        "error": e.to_string(),
                        "status": e.status_code(),
                        "retryable": e.is_retryable(),
                    });
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
                return Err(e.into());
            }
        };

        if self.json {
            let output = serde_json::json!({
                "corpus": self.corpus,
                "results": hits,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else if hits.is_empty() {
            println!("No results");
        } else {
            for (rank, hit) in hits.iter().enumerate() {
                println!("{}. {} (similarity {:.3})", rank + 1, hit.document_id, hit.similarity);
                println!("   {}", hit.chunk_text.replace('\n', "\n   "));
            }
        }

        Ok(())
    }
}
