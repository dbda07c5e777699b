//! Embedding configuration types.

use crate::error::{RetrievalError, RetrievalResult};
use serde::{Deserialize, Serialize};

/// Embedding configuration for a corpus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingConfig {
    /// Provider name: "trigram", "ollama"
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model identifier (provider-specific)
    #[serde(default = "default_model")]
    pub model: String,

    /// Embedding vector dimensions
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    /// Provider endpoint (HTTP providers only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Per-request timeout for HTTP providers, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_provider() -> String {
    "trigram".to_string()
}

fn default_model() -> String {
    "trigram-v1".to_string()
}

fn default_dimensions() -> usize {
    384
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            dimensions: default_dimensions(),
            endpoint: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl EmbeddingConfig {
    pub fn validate(&self) -> RetrievalResult<()> {
        if self.dimensions == 0 {
            return Err(RetrievalError::Config(
                "Embedding dimensions must be greater than zero".to_string(),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(RetrievalError::Config(
                "Embedding model must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Validate that a persisted snapshot was built with a compatible model.
    pub fn validate_consistency(&self, provider: &str, model: &str, dimensions: usize) -> RetrievalResult<()> {
        if self.provider != provider {
            return Err(RetrievalError::Config(format!(
                "Provider mismatch: expected '{}', got '{}'",
                self.provider, provider
            )));
        }

        if self.model != model {
            return Err(RetrievalError::Config(format!(
                "Model mismatch: expected '{}', got '{}'",
                self.model, model
            )));
        }

        if self.dimensions != dimensions {
            return Err(RetrievalError::Config(format!(
                "Dimension mismatch: expected {}, got {}",
                self.dimensions, dimensions
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EmbeddingConfig::default();
        assert_eq!(config.provider, "trigram");
        assert_eq!(config.model, "trigram-v1");
        assert_eq!(config.dimensions, 384);
        assert!(config.endpoint.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: EmbeddingConfig = serde_yaml::from_str("provider: ollama\nmodel: nomic-embed-text\ndimensions: 768\n").unwrap();
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.dimensions, 768);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        let config = EmbeddingConfig {
            dimensions: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_consistency() {
        let config = EmbeddingConfig::default();
        assert!(config.validate_consistency("trigram", "trigram-v1", 384).is_ok());

        let err = config
            .validate_consistency("ollama", "trigram-v1", 384)
            .unwrap_err();
        assert!(err.to_string().contains("Provider mismatch"));

        let err = config
            .validate_consistency("trigram", "trigram-v1", 768)
            .unwrap_err();
        assert!(err.to_string().contains("Dimension mismatch"));
    }
}
