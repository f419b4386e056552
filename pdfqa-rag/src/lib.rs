//! Ingestion, retrieval and grounded answering over PDF collections.
//!
//! This crate provides:
//! - Document sources (local directory, in-memory, Google Drive folder)
//! - PDF and plain-text loaders producing per-page text
//! - Boundary-aware chunking with exact overlap and page attribution
//! - Embedding providers (offline hashing, Ollama)
//! - Vector stores (in-memory, file-backed)
//! - An ingestion pipeline with per-document failure isolation
//! - A retriever and an answering orchestrator with source citations
//!
//! # Feature flags
//!
//! | Feature  | Enables |
//! |----------|---------|
//! | `ollama` | [`ollama::OllamaEmbeddingProvider`] and [`ollama::OllamaGenerator`] |
//! | `gdrive` | [`gdrive::GoogleDriveSource`] |
//! | `full`   | Both of the above |
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use pdfqa_rag::*;
//!
//! let config = RagConfig::from_toml_file("pdfqa.toml")?;
//! let embedder = Arc::new(HashingEmbeddingProvider::new(config.embedding_dimensions)?);
//! let store = Arc::new(FileVectorStore::new(&config.persist_dir));
//!
//! let pipeline = IngestionPipeline::builder()
//!     .config(config.clone())
//!     .embedding_provider(embedder.clone())
//!     .vector_store(store.clone())
//!     .build()?;
//! pipeline.run(&LocalDirectorySource::new("pdfs", ["pdf"]), IngestMode::Rebuild).await?;
//!
//! let retriever = Retriever::new(embedder, store, &config.collection_name, config.top_k);
//! let results = retriever.retrieve("What is the notice period?", 3).await?;
//! ```

pub mod answer;
pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod filestore;
pub mod generation;
pub mod inmemory;
pub mod loader;
pub mod pipeline;
pub mod prompt;
pub mod retriever;
pub mod similarity;
pub mod source;
pub mod vectorstore;

#[cfg(feature = "gdrive")]
pub mod gdrive;
#[cfg(feature = "ollama")]
pub mod ollama;

pub use answer::{Answer, AnswerPayload, AnsweringOrchestrator, Citation};
pub use chunking::{Chunker, FixedSizeChunker, PAGE_SEPARATOR, RecursiveChunker, chunker_for};
pub use config::{ChunkingStrategy, RagConfig, RagConfigBuilder};
pub use document::{Chunk, IndexEntry, Origin, Page, SearchResult, SourceDocument};
pub use embedding::{EmbeddingProvider, HashingEmbeddingProvider};
pub use error::{RagError, Result};
pub use filestore::FileVectorStore;
pub use generation::TextGenerator;
pub use inmemory::InMemoryVectorStore;
pub use loader::{DocumentLoader, ExtensionLoader, PdfLoader, TextLoader};
pub use pipeline::{
    DocumentFailure, IngestMode, IngestReport, IngestionPipeline, IngestionPipelineBuilder,
};
pub use prompt::PromptTemplate;
pub use retriever::Retriever;
pub use similarity::cosine_similarity;
pub use source::{DocumentSource, LocalDirectorySource, SourceEntry, StaticSource};
pub use vectorstore::{CollectionHandle, VectorStore};
