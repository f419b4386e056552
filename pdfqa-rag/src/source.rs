//! Document sources supplying raw bytes to the ingestion pipeline.
//!
//! A source only lists and fetches; it knows nothing about parsing. The
//! pipeline does not care whether bytes come from the local filesystem
//! ([`LocalDirectorySource`]), memory ([`StaticSource`]) or a remote
//! folder (`GoogleDriveSource`, behind the `gdrive` feature).

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::document::Origin;
use crate::error::{RagError, Result};

/// One listed document: an identifier for `fetch` and a display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    /// Identifier passed back to [`DocumentSource::fetch`].
    pub id: String,
    /// Human-readable name, used as the document name in chunk metadata.
    pub display_name: String,
}

/// A supplier of raw document bytes.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// A short name used in logs and errors.
    fn name(&self) -> &str;

    /// List the available documents, in the order they should be ingested.
    async fn list(&self) -> Result<Vec<SourceEntry>>;

    /// Fetch the raw bytes of one listed document.
    async fn fetch(&self, id: &str) -> Result<Vec<u8>>;

    /// Where the document identified by `id` lives.
    fn origin(&self, id: &str) -> Origin;
}

/// Enumerates files in one local directory (non-recursive).
///
/// Only regular files whose extension matches one of `extensions`
/// (case-insensitive) are listed, sorted by file name.
#[derive(Debug, Clone)]
pub struct LocalDirectorySource {
    dir: PathBuf,
    extensions: Vec<String>,
}

impl LocalDirectorySource {
    /// Create a source over `dir` accepting the given extensions (without the dot).
    pub fn new<I, S>(dir: impl Into<PathBuf>, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            dir: dir.into(),
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    fn err(&self, message: String) -> RagError {
        RagError::SourceError { source_name: self.name().to_string(), message }
    }

    fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| self.extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
    }
}

#[async_trait]
impl DocumentSource for LocalDirectorySource {
    fn name(&self) -> &str {
        "local"
    }

    async fn list(&self) -> Result<Vec<SourceEntry>> {
        let mut read_dir = tokio::fs::read_dir(&self.dir).await.map_err(|e| {
            self.err(format!("failed to read directory '{}': {e}", self.dir.display()))
        })?;

        let mut entries = Vec::new();
        while let Some(entry) = read_dir
            .next_entry()
            .await
            .map_err(|e| self.err(format!("failed to list '{}': {e}", self.dir.display())))?
        {
            let path = entry.path();
            let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
            if !is_file || !self.accepts(&path) {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                debug!(path = %path.display(), "skipping non UTF-8 file name");
                continue;
            };
            entries.push(SourceEntry {
                id: path.display().to_string(),
                display_name: file_name.to_string(),
            });
        }

        entries.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        debug!(dir = %self.dir.display(), count = entries.len(), "listed local documents");
        Ok(entries)
    }

    async fn fetch(&self, id: &str) -> Result<Vec<u8>> {
        tokio::fs::read(id).await.map_err(|e| self.err(format!("failed to read '{id}': {e}")))
    }

    fn origin(&self, id: &str) -> Origin {
        Origin::Local { path: PathBuf::from(id) }
    }
}

/// A source over documents already held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    documents: Vec<(String, Vec<u8>)>,
}

impl StaticSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a document; names double as identifiers and must be unique.
    pub fn with_document(mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.documents.push((name.into(), bytes.into()));
        self
    }
}

#[async_trait]
impl DocumentSource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn list(&self) -> Result<Vec<SourceEntry>> {
        Ok(self
            .documents
            .iter()
            .map(|(name, _)| SourceEntry { id: name.clone(), display_name: name.clone() })
            .collect())
    }

    async fn fetch(&self, id: &str) -> Result<Vec<u8>> {
        self.documents.iter().find(|(name, _)| name == id).map(|(_, b)| b.clone()).ok_or_else(
            || RagError::SourceError {
                source_name: self.name().to_string(),
                message: format!("no document named '{id}'"),
            },
        )
    }

    fn origin(&self, _id: &str) -> Origin {
        Origin::Memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn local_source_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.pdf"), b"b").unwrap();
        std::fs::write(dir.path().join("a.PDF"), b"a").unwrap();
        std::fs::write(dir.path().join("notes.md"), b"skip").unwrap();
        std::fs::create_dir(dir.path().join("nested.pdf")).unwrap();

        let source = LocalDirectorySource::new(dir.path(), ["pdf"]);
        let entries = source.list().await.unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.display_name.as_str()).collect();
        assert_eq!(names, vec!["a.PDF", "b.pdf"]);

        assert_eq!(source.fetch(&entries[1].id).await.unwrap(), b"b");
        assert!(matches!(source.origin(&entries[0].id), Origin::Local { .. }));
    }

    #[tokio::test]
    async fn missing_directory_is_a_source_error() {
        let source = LocalDirectorySource::new("/definitely/not/here", ["pdf"]);
        assert!(matches!(source.list().await, Err(RagError::SourceError { .. })));
    }

    #[tokio::test]
    async fn static_source_round_trips_bytes() {
        let source = StaticSource::new().with_document("a.txt", "alpha");
        assert_eq!(source.list().await.unwrap().len(), 1);
        assert_eq!(source.fetch("a.txt").await.unwrap(), b"alpha");
        assert!(source.fetch("b.txt").await.is_err());
    }
}
