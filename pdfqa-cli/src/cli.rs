use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "pdfqa", about = "Ask questions about a collection of PDF documents", version)]
pub struct Cli {
    /// TOML configuration file; missing keys take their defaults
    #[arg(long, global = true, env = "PDFQA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Override the directory holding persisted collections
    #[arg(long, global = true)]
    pub persist_dir: Option<PathBuf>,

    /// Override the collection name
    #[arg(long, global = true)]
    pub collection: Option<String>,

    /// Embedding backend
    #[arg(long, global = true, value_enum, default_value_t = EmbedderKind::Ollama)]
    pub embedder: EmbedderKind,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum EmbedderKind {
    /// Offline feature hashing; no model server needed
    Hashing,
    /// Ollama `/api/embed`
    Ollama,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build or extend the index from a local directory or a Google Drive folder
    Ingest {
        /// Local directory to ingest
        #[arg(long, default_value = "pdfs", conflicts_with = "gdrive_folder")]
        dir: PathBuf,

        /// Google Drive folder id to ingest instead of a local directory
        #[arg(long)]
        gdrive_folder: Option<String>,

        /// Environment variable holding the Drive OAuth access token
        #[arg(long, default_value = "GDRIVE_ACCESS_TOKEN")]
        gdrive_token_env: String,

        /// Replace the collection instead of appending to it
        #[arg(long)]
        rebuild: bool,
    },

    /// Print the chunks most similar to a query
    Search {
        query: String,
        /// Number of results (defaults to top_k from the config)
        #[arg(short = 'k', long = "top-k")]
        k: Option<usize>,
    },

    /// Answer one question and print the result as JSON
    Ask {
        question: String,
        /// Number of context chunks (defaults to top_k from the config)
        #[arg(short = 'k', long = "top-k")]
        k: Option<usize>,
    },

    /// Interactive question loop
    Chat,

    /// Show collection statistics
    Stats,

    /// Export every indexed chunk as one JSON object per line
    Dump {
        /// Include each entry's embedding vector
        #[arg(long)]
        with_embeddings: bool,

        /// Stop after this many entries
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_follow_subcommands() {
        let cli = Cli::parse_from(["pdfqa", "search", "notice period", "-k", "3", "--embedder", "hashing"]);
        assert_eq!(cli.embedder, EmbedderKind::Hashing);
        assert!(matches!(cli.command, Command::Search { ref query, k: Some(3) } if query == "notice period"));
    }

    #[test]
    fn ingest_defaults() {
        let cli = Cli::parse_from(["pdfqa", "ingest"]);
        match cli.command {
            Command::Ingest { dir, gdrive_folder, rebuild, .. } => {
                assert_eq!(dir, PathBuf::from("pdfs"));
                assert!(gdrive_folder.is_none());
                assert!(!rebuild);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn dump_flags() {
        let cli = Cli::parse_from(["pdfqa", "dump"]);
        assert!(matches!(cli.command, Command::Dump { with_embeddings: false, limit: None }));

        let cli = Cli::parse_from(["pdfqa", "dump", "--with-embeddings", "--limit", "10", "--collection", "hr"]);
        assert!(matches!(cli.command, Command::Dump { with_embeddings: true, limit: Some(10) }));
        assert_eq!(cli.collection.as_deref(), Some("hr"));
    }
}
