use anyhow::Context;
use pdfqa_rag::VectorStore;

use crate::app::App;

pub async fn run(app: &App) -> anyhow::Result<()> {
    let handle = app.open_collection().await?;
    let count = app.store().count(&handle).await.context("failed to count entries")?;
    let stats = serde_json::json!({
        "collection": handle.name,
        "dimensions": handle.dimensions,
        "embedder_dimensions": app.dimensions(),
        "entries": count,
        "persist_dir": app.store().root().display().to_string(),
    });
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
