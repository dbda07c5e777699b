//! Document sources and text extraction.
//!
//! Ingestion only sees these two traits. The directory source and the plain
//! text extractor cover local corpora; other backends implement the traits.

use crate::error::{RetrievalError, RetrievalResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A named collection of documents that can be listed and fetched.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Ids of every document in the collection, in a stable order.
    async fn list(&self) -> RetrievalResult<Vec<String>>;

    /// Raw bytes of one document.
    async fn fetch(&self, document_id: &str) -> RetrievalResult<Vec<u8>>;
}

/// Turns raw document bytes into plain text.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, document_id: &str, bytes: &[u8]) -> RetrievalResult<String>;
}

/// Files under a root directory. Ids are `/`-separated paths relative to the root.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
    include: Vec<String>,
    exclude: Vec<String>,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            include: Vec::new(),
            exclude: Vec::new(),
        }
    }

    /// Keep only paths containing one of these substrings.
    pub fn with_include(mut self, include: Vec<String>) -> Self {
        self.include = include;
        self
    }

    /// Drop paths containing any of these substrings.
    pub fn with_exclude(mut self, exclude: Vec<String>) -> Self {
        self.exclude = exclude;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn should_include(&self, id: &str) -> bool {
        if self.exclude.iter().any(|pattern| id.contains(pattern.as_str())) {
            return false;
        }
        self.include.is_empty() || self.include.iter().any(|pattern| id.contains(pattern.as_str()))
    }

    fn resolve(&self, document_id: &str) -> RetrievalResult<PathBuf> {
        let relative = Path::new(document_id);
        if relative.is_absolute()
            || relative
                .components()
                .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(RetrievalError::DocumentExtraction {
                document_id: document_id.to_string(),
                reason: "document id escapes the source root".to_string(),
            });
        }
        Ok(self.root.join(relative))
    }
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|name| name.starts_with('.'))
            .unwrap_or(false)
}

#[async_trait]
impl DocumentSource for DirectorySource {
    async fn list(&self) -> RetrievalResult<Vec<String>> {
        if !self.root.is_dir() {
            return Err(RetrievalError::Config(format!(
                "Document directory does not exist: {:?}",
                self.root
            )));
        }

        let mut ids = Vec::new();
        for entry in WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| !is_hidden(e))
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable directory entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let id = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            if self.should_include(&id) {
                ids.push(id);
            }
        }

        ids.sort();
        tracing::debug!("Found {} documents under {:?}", ids.len(), self.root);
        Ok(ids)
    }

    async fn fetch(&self, document_id: &str) -> RetrievalResult<Vec<u8>> {
        let path = self.resolve(document_id)?;
        tokio::fs::read(&path)
            .await
            .map_err(|e| RetrievalError::DocumentExtraction {
                document_id: document_id.to_string(),
                reason: format!("failed to read {:?}: {}", path, e),
            })
    }
}

/// UTF-8 text extractor that drops whitespace-only paragraphs.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, document_id: &str, bytes: &[u8]) -> RetrievalResult<String> {
        let raw = std::str::from_utf8(bytes).map_err(|e| RetrievalError::DocumentExtraction {
            document_id: document_id.to_string(),
            reason: format!("not valid UTF-8: {}", e),
        })?;

        if raw.contains('\0') {
            return Err(RetrievalError::DocumentExtraction {
                document_id: document_id.to_string(),
                reason: "binary content is not supported".to_string(),
            });
        }

        Ok(clean_paragraphs(raw))
    }
}

/// Normalize line endings and drop paragraphs that are only whitespace.
fn clean_paragraphs(raw: &str) -> String {
    let normalized = raw.replace("\r\n", "\n").replace('\r', "\n");

    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in normalized.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line.trim_end());
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join("\n"));
    }

    paragraphs.join("\n\n")
}
