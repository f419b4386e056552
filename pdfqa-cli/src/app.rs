//! Wiring of configuration, providers and stores shared by every command.

use std::sync::Arc;

use anyhow::Context;
use pdfqa_rag::ollama::{OllamaEmbeddingProvider, OllamaGenerator};
use pdfqa_rag::{
    AnsweringOrchestrator, CollectionHandle, EmbeddingProvider, FileVectorStore,
    HashingEmbeddingProvider, IngestionPipeline, RagConfig, RagConfigBuilder, Retriever,
    VectorStore,
};
use tracing::debug;

use crate::cli::{Cli, EmbedderKind};

pub struct App {
    pub config: RagConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<FileVectorStore>,
}

impl App {
    pub fn new(cli: &Cli) -> anyhow::Result<Self> {
        let config = load_config(cli)?;
        let embedder: Arc<dyn EmbeddingProvider> = match cli.embedder {
            EmbedderKind::Hashing => {
                Arc::new(HashingEmbeddingProvider::new(config.embedding_dimensions)?)
            }
            EmbedderKind::Ollama => Arc::new(OllamaEmbeddingProvider::from_config(&config)?),
        };
        let store = Arc::new(FileVectorStore::new(&config.persist_dir));
        debug!(
            collection = %config.collection_name,
            persist_dir = %config.persist_dir.display(),
            embedder = embedder.name(),
            "initialised components"
        );
        Ok(Self { config, embedder, store })
    }

    pub fn pipeline(&self) -> anyhow::Result<IngestionPipeline> {
        Ok(IngestionPipeline::builder()
            .config(self.config.clone())
            .embedding_provider(self.embedder.clone())
            .vector_store(self.store.clone())
            .build()?)
    }

    pub fn retriever(&self) -> Retriever {
        Retriever::new(
            self.embedder.clone(),
            self.store.clone(),
            &self.config.collection_name,
            self.config.top_k,
        )
    }

    pub fn orchestrator(&self, k: Option<usize>) -> anyhow::Result<AnsweringOrchestrator> {
        let retriever = Retriever::new(
            self.embedder.clone(),
            self.store.clone(),
            &self.config.collection_name,
            k.unwrap_or(self.config.top_k),
        );
        let generator = Arc::new(OllamaGenerator::from_config(&self.config)?);
        Ok(AnsweringOrchestrator::new(retriever, generator))
    }

    /// Open the configured collection, failing if it has never been ingested.
    pub async fn open_collection(&self) -> anyhow::Result<CollectionHandle> {
        let name = &self.config.collection_name;
        self.store
            .open(name)
            .await
            .with_context(|| format!("failed to open collection '{name}'"))?
            .with_context(|| {
                format!(
                    "collection '{name}' does not exist under {}; run `pdfqa ingest` first",
                    self.config.persist_dir.display()
                )
            })
    }

    pub fn store(&self) -> &FileVectorStore {
        &self.store
    }

    pub fn dimensions(&self) -> usize {
        self.embedder.dimensions()
    }
}

/// The config file (or defaults) with command-line overrides applied.
fn load_config(cli: &Cli) -> anyhow::Result<RagConfig> {
    let base = match &cli.config {
        Some(path) => RagConfig::from_toml_file(path)
            .with_context(|| format!("loading configuration from '{}'", path.display()))?,
        None => RagConfig::default(),
    };

    let mut builder = RagConfigBuilder::from_config(base);
    if let Some(dir) = &cli.persist_dir {
        builder = builder.persist_dir(dir);
    }
    if let Some(name) = &cli.collection {
        builder = builder.collection_name(name);
    }
    Ok(builder.build()?)
}
