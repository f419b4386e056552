//! Ingestion pipeline orchestrator.
//!
//! The [`IngestionPipeline`] runs one pass over a [`DocumentSource`]:
//! fetch → load → chunk for every document, then embed the whole pending
//! batch and commit it to the [`VectorStore`] in one `add` or `rebuild`.
//! A document that fails to fetch or load is recorded and skipped; a failure
//! while embedding or storing aborts the pass before anything is written.
//!
//! # Example
//!
//! ```rust,ignore
//! use pdfqa_rag::{IngestionPipeline, IngestMode, LocalDirectorySource, RagConfig};
//!
//! let pipeline = IngestionPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(my_embedder))
//!     .vector_store(Arc::new(FileVectorStore::new("vector_db")))
//!     .build()?;
//!
//! let source = LocalDirectorySource::new("pdfs", ["pdf"]);
//! let report = pipeline.run(&source, IngestMode::Incremental).await?;
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::chunking::{Chunker, chunker_for};
use crate::config::RagConfig;
use crate::document::{Chunk, IndexEntry, SourceDocument};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::loader::{DocumentLoader, ExtensionLoader};
use crate::source::DocumentSource;
use crate::vectorstore::VectorStore;

/// How the pass commits its entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IngestMode {
    /// Append to whatever the collection already holds.
    #[default]
    Incremental,
    /// Replace the collection's contents.
    Rebuild,
}

/// A document that was skipped during a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFailure {
    /// Display name of the document.
    pub document: String,
    /// Why it was skipped.
    pub reason: String,
}

/// Outcome of one ingestion pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    /// Documents listed by the source.
    pub documents_attempted: usize,
    /// Documents fetched and loaded successfully.
    pub documents_processed: usize,
    /// Non-empty chunks produced across all processed documents.
    pub chunks_produced: usize,
    /// Entries written to the vector store.
    pub entries_persisted: usize,
    /// Names of the processed documents, in order.
    pub processed: Vec<String>,
    /// Documents that were skipped.
    pub failures: Vec<DocumentFailure>,
}

/// The ingestion orchestrator.
///
/// Construct one via [`IngestionPipeline::builder()`].
pub struct IngestionPipeline {
    config: RagConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
    chunker: Arc<dyn Chunker>,
    loader: Arc<dyn DocumentLoader>,
}

impl IngestionPipeline {
    /// Create a new [`IngestionPipelineBuilder`].
    pub fn builder() -> IngestionPipelineBuilder {
        IngestionPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Load and chunk one document.
    ///
    /// Document-level metadata (source name, origin, origin-specific ids) is
    /// attached to every chunk. Whitespace-only chunks are dropped.
    pub fn chunk_document(&self, document: &SourceDocument) -> Result<Vec<Chunk>> {
        let pages = self.loader.load(document)?;
        let metadata = document.metadata();
        let chunks: Vec<Chunk> = self
            .chunker
            .chunk(&document.name, &pages, &metadata)
            .into_iter()
            .filter(|c| !c.text.trim().is_empty())
            .collect();
        debug!(document = %document.name, page_count = pages.len(), chunk_count = chunks.len(), "chunked document");
        Ok(chunks)
    }

    /// Run one pass over `source`.
    ///
    /// # Errors
    ///
    /// - [`RagError::SourceError`] if the source cannot be listed.
    /// - [`RagError::EmbeddingError`] if any embedding call fails or returns
    ///   the wrong number of vectors; nothing is written.
    /// - [`RagError::VectorStoreError`] if the collection cannot be opened or written.
    ///
    /// Per-document fetch and load failures are recorded in the report.
    pub async fn run(&self, source: &dyn DocumentSource, mode: IngestMode) -> Result<IngestReport> {
        let listed = source.list().await.map_err(|e| {
            error!(source = source.name(), error = %e, "failed to list documents");
            e
        })?;
        info!(source = source.name(), count = listed.len(), ?mode, "starting ingestion pass");

        let mut report = IngestReport { documents_attempted: listed.len(), ..Default::default() };
        let mut pending: Vec<Chunk> = Vec::new();

        for entry in &listed {
            let bytes = match source.fetch(&entry.id).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(document = %entry.display_name, error = %e, "skipping document: fetch failed");
                    report.failures.push(DocumentFailure {
                        document: entry.display_name.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let document =
                SourceDocument::new(&entry.display_name, source.origin(&entry.id), bytes);
            match self.chunk_document(&document) {
                Ok(chunks) => {
                    info!(document = %document.name, chunk_count = chunks.len(), "processed document");
                    report.documents_processed += 1;
                    report.processed.push(document.name.clone());
                    pending.extend(chunks);
                }
                Err(e) => {
                    warn!(document = %document.name, error = %e, "skipping document: load failed");
                    report.failures.push(DocumentFailure {
                        document: document.name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        report.chunks_produced = pending.len();
        if pending.is_empty() {
            info!(
                documents_attempted = report.documents_attempted,
                "no chunks produced; leaving the existing index untouched"
            );
            return Ok(report);
        }

        let entries = self.embed_chunks(pending).await?;
        let handle = self
            .vector_store
            .open_or_create(&self.config.collection_name, self.embedding_provider.dimensions())
            .await
            .map_err(|e| {
                error!(collection = %self.config.collection_name, error = %e, "failed to open collection");
                e
            })?;

        let persisted = match mode {
            IngestMode::Incremental => self.vector_store.add(&handle, &entries).await,
            IngestMode::Rebuild => self.vector_store.rebuild(&handle, &entries).await,
        }
        .map_err(|e| {
            error!(collection = %handle.name, error = %e, "failed to persist entries");
            e
        })?;

        report.entries_persisted = persisted;
        info!(
            collection = %handle.name,
            documents_attempted = report.documents_attempted,
            documents_processed = report.documents_processed,
            chunks_produced = report.chunks_produced,
            entries_persisted = report.entries_persisted,
            "ingestion pass complete"
        );
        Ok(report)
    }

    /// Embed every chunk, in sub-batches, before anything is written.
    async fn embed_chunks(&self, chunks: Vec<Chunk>) -> Result<Vec<IndexEntry>> {
        let batch_size = self.config.embedding_batch_size.max(1);
        let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(chunks.len());

        for batch in chunks.chunks(batch_size) {
            let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();
            let embedded = self.embedding_provider.embed_batch(&texts).await.map_err(|e| {
                error!(provider = self.embedding_provider.name(), error = %e, "embedding failed during ingestion");
                e
            })?;
            if embedded.len() != batch.len() {
                return Err(RagError::EmbeddingError {
                    provider: self.embedding_provider.name().to_string(),
                    message: format!(
                        "expected {} vectors, provider returned {}",
                        batch.len(),
                        embedded.len()
                    ),
                });
            }
            vectors.extend(embedded);
            debug!(embedded = vectors.len(), total = chunks.len(), "embedded batch");
        }

        Ok(chunks.into_iter().zip(vectors).map(|(chunk, v)| IndexEntry::new(chunk, v)).collect())
    }
}

/// Builder for constructing an [`IngestionPipeline`].
///
/// `config`, `embedding_provider` and `vector_store` are required. The
/// chunker defaults to the one selected by the config and the loader to
/// [`ExtensionLoader`].
#[derive(Default)]
pub struct IngestionPipelineBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    chunker: Option<Arc<dyn Chunker>>,
    loader: Option<Arc<dyn DocumentLoader>>,
}

impl IngestionPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Override the chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Override the document loader.
    pub fn loader(mut self, loader: Arc<dyn DocumentLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Build the [`IngestionPipeline`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if any required field is missing or
    /// the config is invalid.
    pub fn build(self) -> Result<IngestionPipeline> {
        let config =
            self.config.ok_or_else(|| RagError::ConfigError("config is required".to_string()))?;
        config.validate()?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let vector_store = self
            .vector_store
            .ok_or_else(|| RagError::ConfigError("vector_store is required".to_string()))?;
        let chunker = self.chunker.unwrap_or_else(|| chunker_for(&config));
        let loader = self.loader.unwrap_or_else(|| Arc::new(ExtensionLoader::new()));

        Ok(IngestionPipeline { config, embedding_provider, vector_store, chunker, loader })
    }
}
