//! `pdfqa`: ingest PDF collections and ask questions about them.

mod app;
mod cli;
mod commands;
mod logging;

use clap::Parser;

use crate::app::App;
use crate::cli::{Cli, Command};
use crate::commands::ingest::IngestArgs;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level, cli.log_format)?;

    let app = App::new(&cli)?;
    match &cli.command {
        Command::Ingest { dir, gdrive_folder, gdrive_token_env, rebuild } => {
            let args = IngestArgs {
                dir,
                gdrive_folder: gdrive_folder.as_deref(),
                gdrive_token_env,
                rebuild: *rebuild,
            };
            commands::ingest::run(&app, args).await?;
        }
        Command::Search { query, k } => commands::search::run(&app, query, *k).await?,
        Command::Ask { question, k } => commands::ask::run(&app, question, *k).await?,
        Command::Chat => commands::chat::run(&app).await?,
        Command::Stats => commands::stats::run(&app).await?,
        Command::Dump { with_embeddings, limit } => {
            commands::dump::run(&app, *with_embeddings, *limit).await?
        }
    }

    Ok(())
}
