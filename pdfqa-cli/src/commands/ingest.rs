use std::path::Path;

use anyhow::Context;
use pdfqa_rag::gdrive::GoogleDriveSource;
use pdfqa_rag::{DocumentSource, IngestMode, LocalDirectorySource};
use tracing::info;

use crate::app::App;

pub struct IngestArgs<'a> {
    pub dir: &'a Path,
    pub gdrive_folder: Option<&'a str>,
    pub gdrive_token_env: &'a str,
    pub rebuild: bool,
}

pub async fn run(app: &App, args: IngestArgs<'_>) -> anyhow::Result<()> {
    let source: Box<dyn DocumentSource> = match args.gdrive_folder {
        Some(folder) => {
            let token = std::env::var(args.gdrive_token_env).with_context(|| {
                format!("environment variable {} must hold a Drive access token", args.gdrive_token_env)
            })?;
            Box::new(GoogleDriveSource::with_timeout(
                token,
                folder,
                std::time::Duration::from_secs(app.config.request_timeout_secs),
            )?)
        }
        None => Box::new(LocalDirectorySource::new(args.dir, &app.config.source_extensions)),
    };

    let mode = if args.rebuild { IngestMode::Rebuild } else { IngestMode::Incremental };
    info!(source = source.name(), ?mode, collection = %app.config.collection_name, "ingesting");

    let report = app.pipeline()?.run(source.as_ref(), mode).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
