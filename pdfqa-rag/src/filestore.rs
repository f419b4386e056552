//! Persistent vector store backed by JSON files on the local filesystem.
//!
//! Layout under the configured root:
//!
//! ```text
//! <root>/<collection>/manifest.json   collection name, dimensions, format version
//! <root>/<collection>/entries.jsonl   one serialized IndexEntry per line
//! ```
//!
//! Both `add` and `rebuild` write the complete new contents to a temporary
//! file and rename it over `entries.jsonl`, so a failed or interrupted write
//! leaves the previous entries intact and a batch is never half-committed.
//! Entries are loaded into memory when a collection is opened.
//!
//! A single writer per collection is assumed. Readers in other processes see
//! appended entries the next time they open the collection.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::document::{IndexEntry, SearchResult};
use crate::error::{RagError, Result};
use crate::similarity::rank;
use crate::vectorstore::{
    CollectionHandle, VectorStore, check_dimensions, check_query, validate_collection_name,
};

const BACKEND: &str = "file";
const FORMAT_VERSION: u32 = 1;
const MANIFEST_FILE: &str = "manifest.json";
const ENTRIES_FILE: &str = "entries.jsonl";
const ENTRIES_TMP_FILE: &str = "entries.jsonl.tmp";

#[derive(Debug, Serialize, Deserialize)]
struct Manifest {
    collection: String,
    dimensions: usize,
    format_version: u32,
}

#[derive(Debug)]
struct LoadedCollection {
    dimensions: usize,
    entries: Vec<IndexEntry>,
}

fn io_err(action: &str, path: &Path, e: std::io::Error) -> RagError {
    RagError::store(BACKEND, format!("failed to {action} '{}': {e}", path.display()))
}

/// A [`VectorStore`] persisting each collection as a directory of JSON files.
///
/// # Example
///
/// ```rust,ignore
/// use pdfqa_rag::{FileVectorStore, VectorStore};
///
/// let store = FileVectorStore::new("vector_db");
/// let handle = store.open_or_create("pdf_collection", 384).await?;
/// println!("{} entries", store.count(&handle).await?);
/// ```
#[derive(Debug)]
pub struct FileVectorStore {
    root: PathBuf,
    cache: RwLock<HashMap<String, LoadedCollection>>,
}

impl FileVectorStore {
    /// Create a store rooted at `root`. Nothing is touched on disk until a
    /// collection is opened.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), cache: RwLock::new(HashMap::new()) }
    }

    /// The directory holding all collections.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    async fn read_manifest(path: &Path) -> Result<Option<Manifest>> {
        if !tokio::fs::try_exists(path).await.map_err(|e| io_err("stat", path, e))? {
            return Ok(None);
        }
        let text = tokio::fs::read_to_string(path).await.map_err(|e| io_err("read", path, e))?;
        let manifest: Manifest = serde_json::from_str(&text).map_err(|e| {
            RagError::store(BACKEND, format!("corrupt manifest '{}': {e}", path.display()))
        })?;
        if manifest.format_version != FORMAT_VERSION {
            return Err(RagError::store(
                BACKEND,
                format!(
                    "unsupported format version {} in '{}'",
                    manifest.format_version,
                    path.display()
                ),
            ));
        }
        Ok(Some(manifest))
    }

    async fn read_entries(path: &Path) -> Result<Vec<IndexEntry>> {
        if !tokio::fs::try_exists(path).await.map_err(|e| io_err("stat", path, e))? {
            return Ok(Vec::new());
        }
        let text = tokio::fs::read_to_string(path).await.map_err(|e| io_err("read", path, e))?;
        text.lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| {
                serde_json::from_str::<IndexEntry>(line).map_err(|e| {
                    RagError::store(
                        BACKEND,
                        format!("corrupt entry at {}:{}: {e}", path.display(), i + 1),
                    )
                })
            })
            .collect()
    }

    fn encode_entries(entries: &[IndexEntry]) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        for entry in entries {
            serde_json::to_writer(&mut buf, entry).map_err(|e| {
                RagError::store(BACKEND, format!("failed to serialize entry '{}': {e}", entry.id))
            })?;
            buf.push(b'\n');
        }
        Ok(buf)
    }

    /// Replace the entries file with its current lines (when `keep_existing`)
    /// followed by `buf`.
    ///
    /// The new contents go to a temporary file that is synced and then renamed
    /// over the entries file. On failure the temporary file is removed and the
    /// entries file is left as it was.
    async fn commit_entries(dir: &Path, buf: &[u8], keep_existing: bool) -> Result<()> {
        let tmp = dir.join(ENTRIES_TMP_FILE);
        let path = dir.join(ENTRIES_FILE);

        let result = async {
            let exists =
                tokio::fs::try_exists(&path).await.map_err(|e| io_err("stat", &path, e))?;
            let mut contents = if keep_existing && exists {
                tokio::fs::read(&path).await.map_err(|e| io_err("read", &path, e))?
            } else {
                Vec::new()
            };
            if !contents.is_empty() && !contents.ends_with(b"\n") {
                contents.push(b'\n');
            }
            contents.extend_from_slice(buf);

            let mut file =
                tokio::fs::File::create(&tmp).await.map_err(|e| io_err("create", &tmp, e))?;
            file.write_all(&contents).await.map_err(|e| io_err("write", &tmp, e))?;
            file.sync_all().await.map_err(|e| io_err("sync", &tmp, e))?;
            drop(file);
            tokio::fs::rename(&tmp, &path).await.map_err(|e| io_err("replace", &path, e))
        }
        .await;

        if result.is_err() {
            match tokio::fs::remove_file(&tmp).await {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                    warn!(path = %tmp.display(), error = %e, "failed to remove temporary entries file");
                }
                _ => {}
            }
        }
        result
    }

    /// Read a collection's entries from disk into the cache.
    async fn load(&self, name: &str, dimensions: usize) -> Result<CollectionHandle> {
        let entries = Self::read_entries(&self.collection_dir(name).join(ENTRIES_FILE)).await?;
        debug!(collection = name, count = entries.len(), "opened collection");
        self.cache.write().await.insert(name.to_string(), LoadedCollection { dimensions, entries });
        Ok(CollectionHandle { name: name.to_string(), dimensions })
    }

    /// Load the collection into the cache if it is not already there.
    async fn ensure_loaded(&self, collection: &CollectionHandle) -> Result<()> {
        if self.cache.read().await.contains_key(&collection.name) {
            return Ok(());
        }
        self.open_or_create(&collection.name, collection.dimensions).await.map(|_| ())
    }
}

#[async_trait]
impl VectorStore for FileVectorStore {
    async fn open_or_create(&self, name: &str, dimensions: usize) -> Result<CollectionHandle> {
        validate_collection_name(BACKEND, name)?;
        let dir = self.collection_dir(name);
        tokio::fs::create_dir_all(&dir).await.map_err(|e| io_err("create", &dir, e))?;

        let manifest_path = dir.join(MANIFEST_FILE);
        match Self::read_manifest(&manifest_path).await? {
            Some(manifest) if manifest.dimensions != dimensions => {
                return Err(RagError::store(
                    BACKEND,
                    format!(
                        "collection '{name}' has {} dimensions, requested {dimensions}",
                        manifest.dimensions
                    ),
                ));
            }
            Some(_) => {}
            None => {
                let manifest = Manifest {
                    collection: name.to_string(),
                    dimensions,
                    format_version: FORMAT_VERSION,
                };
                let json = serde_json::to_vec_pretty(&manifest).map_err(|e| {
                    RagError::store(BACKEND, format!("failed to serialize manifest: {e}"))
                })?;
                tokio::fs::write(&manifest_path, json)
                    .await
                    .map_err(|e| io_err("write", &manifest_path, e))?;
                info!(collection = name, dimensions, path = %dir.display(), "created collection");
            }
        }

        self.load(name, dimensions).await
    }

    async fn open(&self, name: &str) -> Result<Option<CollectionHandle>> {
        validate_collection_name(BACKEND, name)?;
        let manifest_path = self.collection_dir(name).join(MANIFEST_FILE);
        match Self::read_manifest(&manifest_path).await? {
            Some(manifest) => self.load(name, manifest.dimensions).await.map(Some),
            None => Ok(None),
        }
    }

    async fn add(&self, collection: &CollectionHandle, entries: &[IndexEntry]) -> Result<usize> {
        if entries.is_empty() {
            return Ok(0);
        }
        check_dimensions(BACKEND, collection, entries)?;
        self.ensure_loaded(collection).await?;

        let buf = Self::encode_entries(entries)?;
        let dir = self.collection_dir(&collection.name);

        let mut cache = self.cache.write().await;
        Self::commit_entries(&dir, &buf, true).await?;

        if let Some(loaded) = cache.get_mut(&collection.name) {
            loaded.entries.extend_from_slice(entries);
        }
        debug!(collection = %collection.name, count = entries.len(), "appended entries");
        Ok(entries.len())
    }

    async fn search(
        &self,
        collection: &CollectionHandle,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        self.ensure_loaded(collection).await?;
        let cache = self.cache.read().await;
        let loaded = cache.get(&collection.name).ok_or_else(|| {
            RagError::store(BACKEND, format!("collection '{}' is not open", collection.name))
        })?;
        check_query(BACKEND, &collection.name, loaded.dimensions, embedding)?;
        Ok(rank(&loaded.entries, embedding, top_k))
    }

    async fn rebuild(
        &self,
        collection: &CollectionHandle,
        entries: &[IndexEntry],
    ) -> Result<usize> {
        check_dimensions(BACKEND, collection, entries)?;
        self.ensure_loaded(collection).await?;

        let buf = Self::encode_entries(entries)?;
        let dir = self.collection_dir(&collection.name);

        let mut cache = self.cache.write().await;
        Self::commit_entries(&dir, &buf, false).await?;

        cache.insert(
            collection.name.clone(),
            LoadedCollection { dimensions: collection.dimensions, entries: entries.to_vec() },
        );
        info!(collection = %collection.name, count = entries.len(), "rebuilt collection");
        Ok(entries.len())
    }

    async fn count(&self, collection: &CollectionHandle) -> Result<usize> {
        self.ensure_loaded(collection).await?;
        let cache = self.cache.read().await;
        Ok(cache.get(&collection.name).map_or(0, |loaded| loaded.entries.len()))
    }

    async fn entries(&self, collection: &CollectionHandle) -> Result<Vec<IndexEntry>> {
        self.ensure_loaded(collection).await?;
        let cache = self.cache.read().await;
        Ok(cache.get(&collection.name).map(|loaded| loaded.entries.clone()).unwrap_or_default())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        validate_collection_name(BACKEND, name)?;
        let dir = self.collection_dir(name);
        let mut cache = self.cache.write().await;
        if tokio::fs::try_exists(&dir).await.map_err(|e| io_err("stat", &dir, e))? {
            tokio::fs::remove_dir_all(&dir).await.map_err(|e| io_err("remove", &dir, e))?;
            info!(collection = name, "deleted collection");
        }
        cache.remove(name);
        Ok(())
    }
}
