//! Vector store trait for persisting and searching index entries.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::document::{IndexEntry, SearchResult};
use crate::error::{RagError, Result};

/// An opened collection: its name and the vector dimensionality it accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionHandle {
    /// Collection name.
    pub name: String,
    /// Length of every vector stored in the collection.
    pub dimensions: usize,
}

/// A storage backend for index entries with similarity search.
///
/// Entries are never mutated in place: [`add`](VectorStore::add) appends and
/// [`rebuild`](VectorStore::rebuild) replaces the whole collection. Adding
/// the same content twice stores it twice; de-duplication is the caller's
/// concern.
///
/// # Example
///
/// ```rust,ignore
/// use pdfqa_rag::{FileVectorStore, VectorStore};
///
/// let store = FileVectorStore::new("vector_db");
/// let handle = store.open_or_create("pdf_collection", 384).await?;
/// store.add(&handle, &entries).await?;
/// let results = store.search(&handle, &query_embedding, 5).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Open a collection, creating empty state if it does not exist.
    async fn open_or_create(&self, name: &str, dimensions: usize) -> Result<CollectionHandle>;

    /// Open an existing collection without creating anything.
    ///
    /// Returns `Ok(None)` when no collection called `name` exists.
    async fn open(&self, name: &str) -> Result<Option<CollectionHandle>>;

    /// Append entries and return how many were added. Zero entries is a no-op returning 0.
    async fn add(&self, collection: &CollectionHandle, entries: &[IndexEntry]) -> Result<usize>;

    /// Search for the `top_k` most similar entries to `embedding`.
    ///
    /// Returns at most `top_k` results ordered by descending similarity score.
    async fn search(
        &self,
        collection: &CollectionHandle,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>>;

    /// Discard every entry of the collection, then add `entries`.
    async fn rebuild(&self, collection: &CollectionHandle, entries: &[IndexEntry])
    -> Result<usize>;

    /// Number of entries stored in the collection.
    async fn count(&self, collection: &CollectionHandle) -> Result<usize>;

    /// Every entry of the collection, in insertion order.
    async fn entries(&self, collection: &CollectionHandle) -> Result<Vec<IndexEntry>>;

    /// Delete a named collection and all its data. No-op if it does not exist.
    async fn delete_collection(&self, name: &str) -> Result<()>;
}

/// Reject collection names that cannot be used as a directory or key.
pub(crate) fn validate_collection_name(backend: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(RagError::store(backend, "collection name must not be empty"));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return Err(RagError::store(
            backend,
            format!("collection name '{name}' may only contain [A-Za-z0-9_-]"),
        ));
    }
    Ok(())
}

/// Ensure every entry's vector matches the collection dimensionality and is finite.
pub(crate) fn check_dimensions(
    backend: &str,
    collection: &CollectionHandle,
    entries: &[IndexEntry],
) -> Result<()> {
    for entry in entries {
        if entry.embedding.len() != collection.dimensions {
            return Err(RagError::store(
                backend,
                format!(
                    "entry '{}' has {} dimensions, collection '{}' expects {}",
                    entry.id,
                    entry.embedding.len(),
                    collection.name,
                    collection.dimensions
                ),
            ));
        }
        if !entry.embedding.iter().all(|x| x.is_finite()) {
            return Err(RagError::store(
                backend,
                format!("entry '{}' has a non-finite component", entry.id),
            ));
        }
    }
    Ok(())
}

/// Validate a query vector against a collection of `dimensions`.
pub(crate) fn check_query(
    backend: &str,
    collection: &str,
    dimensions: usize,
    query: &[f32],
) -> Result<()> {
    if query.len() != dimensions {
        return Err(RagError::store(
            backend,
            format!(
                "query has {} dimensions, collection '{collection}' expects {dimensions}",
                query.len()
            ),
        ));
    }
    if !query.iter().all(|x| x.is_finite()) {
        return Err(RagError::store(backend, "query has a non-finite component"));
    }
    Ok(())
}
