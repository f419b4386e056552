use pdfqa_rag::document::{META_PAGE_END, META_SOURCE};

use crate::app::App;

pub async fn run(app: &App, query: &str, k: Option<usize>) -> anyhow::Result<()> {
    let retriever = app.retriever();
    let results = retriever.retrieve(query, k.unwrap_or(retriever.default_k())).await?;
    if results.is_empty() {
        println!("No matching chunks in collection '{}'.", app.config.collection_name);
        return Ok(());
    }

    for (rank, result) in results.iter().enumerate() {
        let chunk = &result.chunk;
        let source = chunk.metadata.get(META_SOURCE).unwrap_or(&chunk.document);
        let pages = match chunk.metadata.get(META_PAGE_END) {
            Some(end) if *end != chunk.page.to_string() => format!("{}-{end}", chunk.page),
            _ => chunk.page.to_string(),
        };
        println!("{:>2}. [{:.4}] {source} (page {pages}, offset {})", rank + 1, result.score, chunk.start_index);
        println!("    {}", chunk.snippet(200).replace('\n', " "));
    }
    Ok(())
}
