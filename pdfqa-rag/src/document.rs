//! Data types for source documents, pages, chunks, index entries and search results.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Metadata key holding the display name of the source document.
pub const META_SOURCE: &str = "source";
/// Metadata key holding the origin of the source document.
pub const META_ORIGIN: &str = "origin";
/// Metadata key holding the page index at which a chunk starts.
pub const META_PAGE: &str = "page";
/// Metadata key holding the page index at which a chunk ends.
pub const META_PAGE_END: &str = "page_end";
/// Metadata key holding the chunk's character offset in the document text.
pub const META_START_INDEX: &str = "start_index";
/// Metadata key holding the Google Drive file id for remote documents.
pub const META_GDRIVE_FILE_ID: &str = "gdrive_file_id";

/// Where a [`SourceDocument`] came from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Origin {
    /// A file on the local filesystem.
    Local {
        /// Path to the file.
        path: PathBuf,
    },
    /// A file held by a remote document store.
    Remote {
        /// The store's identifier for the file.
        id: String,
        /// Metadata key under which the identifier is recorded on chunks.
        id_key: String,
    },
    /// Bytes supplied directly by the caller.
    Memory,
}

impl Origin {
    /// A compact, human-readable form stored under [`META_ORIGIN`].
    pub fn describe(&self) -> String {
        match self {
            Origin::Local { path } => path.display().to_string(),
            Origin::Remote { id, .. } => format!("remote:{id}"),
            Origin::Memory => "memory".to_string(),
        }
    }

    /// Metadata contributed by this origin to every chunk of the document.
    pub fn metadata(&self) -> HashMap<String, String> {
        let mut metadata = HashMap::from([(META_ORIGIN.to_string(), self.describe())]);
        if let Origin::Remote { id, id_key } = self {
            metadata.insert(id_key.clone(), id.clone());
        }
        metadata
    }
}

/// One raw input file, alive between fetching and loading.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// Unique display name (usually the file name).
    pub name: String,
    /// Where the bytes came from.
    pub origin: Origin,
    /// Raw file content.
    pub bytes: Vec<u8>,
}

impl SourceDocument {
    /// Create a document from its name, origin and raw bytes.
    pub fn new(name: impl Into<String>, origin: Origin, bytes: Vec<u8>) -> Self {
        Self { name: name.into(), origin, bytes }
    }

    /// The lowercase file extension of the document name, if any.
    pub fn extension(&self) -> Option<String> {
        std::path::Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }

    /// Document-level metadata inherited by every chunk.
    pub fn metadata(&self) -> HashMap<String, String> {
        let mut metadata = self.origin.metadata();
        metadata.insert(META_SOURCE.to_string(), self.name.clone());
        metadata
    }
}

/// Extracted text of one physical page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Page {
    /// The page text.
    pub text: String,
    /// Zero-based page index.
    pub index: usize,
    /// Name of the [`SourceDocument`] the page belongs to.
    pub document: String,
}

impl Page {
    /// Create a page record.
    pub fn new(document: impl Into<String>, index: usize, text: impl Into<String>) -> Self {
        Self { text: text.into(), index, document: document.into() }
    }
}

/// A contiguous span of one document's text: the unit of embedding and retrieval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Identifier of the chunk within its document, `{document}#{start_index}`.
    pub id: String,
    /// The chunk text.
    pub text: String,
    /// Character offset of the chunk within the concatenated document text.
    pub start_index: usize,
    /// Index of the page on which the chunk starts.
    pub page: usize,
    /// Name of the source document.
    pub document: String,
    /// Inherited document metadata plus chunk-specific provenance fields.
    pub metadata: HashMap<String, String>,
}

impl Chunk {
    /// The number of characters in the chunk.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// The first `max_chars` characters of the chunk text.
    pub fn snippet(&self, max_chars: usize) -> String {
        self.text.chars().take(max_chars).collect()
    }
}

/// A persisted chunk with its embedding vector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexEntry {
    /// Generated identifier, unique within a collection.
    pub id: String,
    /// The embedding of `chunk.text`.
    pub embedding: Vec<f32>,
    /// The indexed chunk.
    pub chunk: Chunk,
}

impl IndexEntry {
    /// Pair a chunk with its vector under a freshly generated id.
    pub fn new(chunk: Chunk, embedding: Vec<f32>) -> Self {
        Self { id: uuid::Uuid::new_v4().to_string(), embedding, chunk }
    }
}

/// A retrieved [`Chunk`] paired with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// The similarity score (higher is more relevant).
    pub score: f32,
}
