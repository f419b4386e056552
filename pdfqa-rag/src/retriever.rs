//! Query-time retrieval: embed the question, search the collection.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::document::SearchResult;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::vectorstore::{CollectionHandle, VectorStore};

const BACKEND: &str = "retriever";

/// Embeds a query and returns the `k` most similar chunks of one collection.
///
/// Results are passed through unchanged: no re-ranking and no score
/// threshold, ordered by descending similarity. The collection is opened on
/// the first call and the handle reused afterwards; it is never created, so
/// a mistyped collection name is an error rather than an empty index.
///
/// # Example
///
/// ```rust,ignore
/// use pdfqa_rag::Retriever;
///
/// let retriever = Retriever::new(embedder, store, "pdf_collection", 5);
/// let results = retriever.retrieve("What is the notice period?", 3).await?;
/// ```
pub struct Retriever {
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
    collection_name: String,
    default_k: usize,
    handle: OnceCell<CollectionHandle>,
}

impl Retriever {
    /// Create a retriever over `collection_name` with `default_k` results per query.
    pub fn new(
        embedding_provider: Arc<dyn EmbeddingProvider>,
        vector_store: Arc<dyn VectorStore>,
        collection_name: impl Into<String>,
        default_k: usize,
    ) -> Self {
        Self {
            embedding_provider,
            vector_store,
            collection_name: collection_name.into(),
            default_k,
            handle: OnceCell::new(),
        }
    }

    /// The `k` used by [`retrieve_default`](Self::retrieve_default).
    pub fn default_k(&self) -> usize {
        self.default_k
    }

    /// Number of entries in the underlying collection.
    pub async fn count(&self) -> Result<usize> {
        let handle = self.handle().await?;
        self.vector_store.count(handle).await
    }

    async fn handle(&self) -> Result<&CollectionHandle> {
        self.handle.get_or_try_init(|| self.open_existing()).await
    }

    async fn open_existing(&self) -> Result<CollectionHandle> {
        let handle = self.vector_store.open(&self.collection_name).await?.ok_or_else(|| {
            warn!(collection = %self.collection_name, "collection does not exist");
            RagError::store(
                BACKEND,
                format!(
                    "collection '{}' does not exist; run an ingestion pass first",
                    self.collection_name
                ),
            )
        })?;
        let expected = self.embedding_provider.dimensions();
        if handle.dimensions != expected {
            return Err(RagError::store(
                BACKEND,
                format!(
                    "collection '{}' holds {}-dimensional vectors but {} produces {expected}",
                    handle.name,
                    handle.dimensions,
                    self.embedding_provider.name()
                ),
            ));
        }
        Ok(handle)
    }

    /// Return at most `k` results for `query`, most relevant first.
    ///
    /// # Errors
    ///
    /// - [`RagError::InvalidQuery`] when `k` is zero.
    /// - [`RagError::VectorStoreError`] when the collection does not exist or
    ///   was built with a different embedding dimensionality.
    /// - [`RagError::EmbeddingError`] or [`RagError::VectorStoreError`] from the backends.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        if k == 0 {
            return Err(RagError::InvalidQuery("k must be at least 1".to_string()));
        }
        let handle = self.handle().await?;
        let embedding = self.embedding_provider.embed(query).await?;
        let results = self.vector_store.search(handle, &embedding, k).await?;

        debug!(collection = %handle.name, k, returned = results.len(), "retrieved chunks");
        if results.is_empty() {
            info!(collection = %handle.name, "no chunks matched the query");
        }
        Ok(results)
    }

    /// [`retrieve`](Self::retrieve) with the configured default `k`.
    pub async fn retrieve_default(&self, query: &str) -> Result<Vec<SearchResult>> {
        self.retrieve(query, self.default_k).await
    }
}
