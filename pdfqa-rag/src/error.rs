//! Error types for the `pdfqa-rag` crate.

use thiserror::Error;

/// Errors that can occur while ingesting, retrieving or answering.
#[derive(Debug, Error)]
pub enum RagError {
    /// A source document could not be parsed into pages.
    ///
    /// During ingestion this is recovered per document: the document is
    /// skipped and recorded in the report.
    #[error("Load error ({document}): {message}")]
    LoadError {
        /// Display name of the document that failed to load.
        document: String,
        /// A description of the failure.
        message: String,
    },

    /// A document source failed to list or fetch documents.
    #[error("Source error ({source_name}): {message}")]
    SourceError {
        /// The document source that produced the error.
        source_name: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStoreError {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// The caller supplied retrieval parameters that cannot be honoured.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// The caller supplied an empty or whitespace-only question.
    #[error("Query cannot be empty")]
    EmptyQuery,

    /// The generation model call failed.
    #[error("Generation error ({provider}): {message}")]
    GenerationError {
        /// The generation backend that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An error in the ingestion pipeline orchestration.
    #[error("Pipeline error: {0}")]
    PipelineError(String),
}

impl RagError {
    pub(crate) fn load(document: impl Into<String>, message: impl Into<String>) -> Self {
        Self::LoadError { document: document.into(), message: message.into() }
    }

    pub(crate) fn store(backend: &str, message: impl Into<String>) -> Self {
        Self::VectorStoreError { backend: backend.to_string(), message: message.into() }
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
