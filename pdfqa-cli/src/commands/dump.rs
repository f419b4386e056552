use std::io::Write;

use anyhow::Context;
use pdfqa_rag::VectorStore;
use pdfqa_rag::document::{META_PAGE_END, META_SOURCE};
use tracing::info;

use crate::app::App;

/// Write the collection as JSON lines: chunk provenance, text and optionally the vector.
pub async fn run(app: &App, with_embeddings: bool, limit: Option<usize>) -> anyhow::Result<()> {
    let handle = app.open_collection().await?;
    let entries = app.store().entries(&handle).await.context("failed to read entries")?;
    let total = entries.len();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut written = 0;
    for entry in entries.iter().take(limit.unwrap_or(usize::MAX)) {
        let chunk = &entry.chunk;
        let mut record = serde_json::json!({
            "id": entry.id,
            "chunk_id": chunk.id,
            "source": chunk.metadata.get(META_SOURCE).unwrap_or(&chunk.document),
            "page": chunk.page,
            "page_end": chunk.metadata.get(META_PAGE_END),
            "start_index": chunk.start_index,
            "text": chunk.text,
            "metadata": chunk.metadata,
        });
        if with_embeddings {
            record["embedding"] = serde_json::json!(entry.embedding);
        }
        serde_json::to_writer(&mut out, &record)?;
        writeln!(out)?;
        written += 1;
    }
    out.flush()?;

    info!(collection = %handle.name, written, total, "dumped collection");
    Ok(())
}
