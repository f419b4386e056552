//! In-memory vector store using cosine similarity.
//!
//! This module provides [`InMemoryVectorStore`], a vector store backed by a
//! `HashMap` protected by a `tokio::sync::RwLock`. Nothing survives the
//! process; use [`FileVectorStore`](crate::FileVectorStore) for a persisted
//! index.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::document::{IndexEntry, SearchResult};
use crate::error::{RagError, Result};
use crate::similarity::rank;
use crate::vectorstore::{
    CollectionHandle, VectorStore, check_dimensions, check_query, validate_collection_name,
};

const BACKEND: &str = "InMemory";

#[derive(Debug)]
struct MemoryCollection {
    dimensions: usize,
    entries: Vec<IndexEntry>,
}

/// An in-memory vector store using cosine similarity for search.
///
/// Collections are stored as collection name → entries in insertion order.
///
/// # Example
///
/// ```rust,ignore
/// use pdfqa_rag::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// let handle = store.open_or_create("docs", 384).await?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, MemoryCollection>>,
}

impl InMemoryVectorStore {
    /// Create a new empty in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn missing(name: &str) -> RagError {
    RagError::store(BACKEND, format!("collection '{name}' does not exist"))
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn open_or_create(&self, name: &str, dimensions: usize) -> Result<CollectionHandle> {
        validate_collection_name(BACKEND, name)?;
        let mut collections = self.collections.write().await;
        let collection = collections
            .entry(name.to_string())
            .or_insert_with(|| MemoryCollection { dimensions, entries: Vec::new() });
        if collection.dimensions != dimensions {
            return Err(RagError::store(
                BACKEND,
                format!(
                    "collection '{name}' has {} dimensions, requested {dimensions}",
                    collection.dimensions
                ),
            ));
        }
        Ok(CollectionHandle { name: name.to_string(), dimensions })
    }

    async fn open(&self, name: &str) -> Result<Option<CollectionHandle>> {
        validate_collection_name(BACKEND, name)?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(name)
            .map(|c| CollectionHandle { name: name.to_string(), dimensions: c.dimensions }))
    }

    async fn add(&self, collection: &CollectionHandle, entries: &[IndexEntry]) -> Result<usize> {
        if entries.is_empty() {
            return Ok(0);
        }
        check_dimensions(BACKEND, collection, entries)?;
        let mut collections = self.collections.write().await;
        let store = collections.get_mut(&collection.name).ok_or_else(|| missing(&collection.name))?;
        store.entries.extend_from_slice(entries);
        Ok(entries.len())
    }

    async fn search(
        &self,
        collection: &CollectionHandle,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        let collections = self.collections.read().await;
        let store = collections.get(&collection.name).ok_or_else(|| missing(&collection.name))?;
        check_query(BACKEND, &collection.name, store.dimensions, embedding)?;
        Ok(rank(&store.entries, embedding, top_k))
    }

    async fn rebuild(
        &self,
        collection: &CollectionHandle,
        entries: &[IndexEntry],
    ) -> Result<usize> {
        check_dimensions(BACKEND, collection, entries)?;
        let mut collections = self.collections.write().await;
        let store = collections.get_mut(&collection.name).ok_or_else(|| missing(&collection.name))?;
        store.entries = entries.to_vec();
        Ok(entries.len())
    }

    async fn count(&self, collection: &CollectionHandle) -> Result<usize> {
        let collections = self.collections.read().await;
        let store = collections.get(&collection.name).ok_or_else(|| missing(&collection.name))?;
        Ok(store.entries.len())
    }

    async fn entries(&self, collection: &CollectionHandle) -> Result<Vec<IndexEntry>> {
        let collections = self.collections.read().await;
        let store = collections.get(&collection.name).ok_or_else(|| missing(&collection.name))?;
        Ok(store.entries.clone())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections.remove(name);
        Ok(())
    }
}
