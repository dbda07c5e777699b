//! Command handlers for the sift CLI.
//!
//! One submodule per command.

pub mod clean;
pub mod ingest;
pub mod query;
pub mod stats;

// Re-export command types for convenience
pub use clean::CleanCommand;
pub use ingest::IngestCommand;
pub use query::QueryCommand;
pub use stats::StatsCommand;
