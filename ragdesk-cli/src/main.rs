//! # ragdesk
//!
//! Ask questions about your PDF files.
//!
//! ```bash
//! export DASHSCOPE_API_KEY=sk-...
//!
//! # Process documents (replaces any previous index)
//! ragdesk ingest manual.pdf handbook.pdf
//!
//! # One-shot question
//! ragdesk ask "How long is the warranty?"
//!
//! # Interactive chat (the default)
//! ragdesk
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ragdesk_cli::{AppConfig, Overrides, RagApp, Reply, run_console, telemetry};

#[derive(Parser)]
#[command(name = "ragdesk")]
#[command(about = "Chat with your PDF documents")]
#[command(version)]
struct Cli {
    /// API key for the OpenAI-compatible endpoint (default: $DASHSCOPE_API_KEY)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Base URL of the OpenAI-compatible endpoint
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Chat model name
    #[arg(long, global = true)]
    model: Option<String>,

    /// Embedding model name
    #[arg(long, global = true)]
    embedding_model: Option<String>,

    /// Directory holding the vector index
    #[arg(long, global = true)]
    index_dir: Option<PathBuf>,

    /// Maximum chunk length in characters
    #[arg(long, global = true)]
    chunk_size: Option<usize>,

    /// Characters shared by consecutive chunks
    #[arg(long, global = true)]
    chunk_overlap: Option<usize>,

    /// Passages retrieved per lookup
    #[arg(long, global = true)]
    top_k: Option<usize>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Process PDF files into a fresh index
    Ingest {
        /// Files to process
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Ask a single question
    Ask {
        /// The question
        question: String,
    },

    /// Delete the index
    Clear,

    /// Show the index status
    Status,

    /// Start an interactive chat
    Chat,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            api_key: self.api_key.clone(),
            base_url: self.base_url.clone(),
            chat_model: self.model.clone(),
            embedding_model: self.embedding_model.clone(),
            index_dir: self.index_dir.clone(),
            chunk_size: self.chunk_size,
            chunk_overlap: self.chunk_overlap,
            top_k: self.top_k,
        }
    }
}

fn report(reply: Reply) -> ExitCode {
    if reply.is_error() {
        eprintln!("{reply}");
        ExitCode::FAILURE
    } else {
        println!("{reply}");
        ExitCode::SUCCESS
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    telemetry::init(cli.log_json);

    let config = AppConfig::from_env(cli.overrides()).context("invalid configuration")?;
    let app = RagApp::from_config(&config).context("failed to start")?;

    let code = match cli.command.unwrap_or(Commands::Chat) {
        Commands::Ingest { files } => report(app.ingest_paths(&files).await),
        Commands::Ask { question } => report(app.ask(&question).await),
        Commands::Clear => report(app.clear().await),
        Commands::Status => report(app.status().await),
        Commands::Chat => {
            run_console(&app).await?;
            ExitCode::SUCCESS
        }
    };
    Ok(code)
}
