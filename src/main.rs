mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use episodic::config::EpisodicConfig;

#[derive(Parser)]
#[command(name = "episodic", version, about = "Episodic: your personal digital memory")]
struct Cli {
    /// Config file (defaults to ~/.episodic/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build or update the memory from log files under a directory
    Build {
        /// Root directory to scan (recursively) for log files
        directory: PathBuf,
    },
    /// Search the memory by meaning
    Search {
        /// Text to search for
        query: String,
        /// Number of results to show
        #[arg(long, short = 'k')]
        top_k: Option<usize>,
    },
    /// Generate and store embeddings for new messages
    Embed,
    /// Manage the word-frequency lexicon
    Lexicon {
        #[command(subcommand)]
        action: LexiconAction,
    },
    /// Write every message as a chronological JSON array
    Export {
        /// Output file (stdout if omitted)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Show memory statistics
    Stats,
    /// Manage the embedding model
    Model {
        #[command(subcommand)]
        action: ModelAction,
    },
}

#[derive(Subcommand)]
enum LexiconAction {
    /// Rebuild the lexicon from stored messages
    Build,
    /// Look up a word's frequency
    Search {
        word: String,
    },
}

#[derive(Subcommand)]
enum ModelAction {
    /// Download the embedding model to ~/.episodic/models/
    Download,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EpisodicConfig::load_from(path)?,
        None => EpisodicConfig::load()?,
    };

    // Log to stderr so stdout stays clean for command output.
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Build { directory } => cli::build::build(&config, &directory)?,
        Command::Search { query, top_k } => cli::search::search(&config, &query, top_k)?,
        Command::Embed => cli::embed::embed(&config)?,
        Command::Lexicon { action } => match action {
            LexiconAction::Build => cli::lexicon::build(&config)?,
            LexiconAction::Search { word } => cli::lexicon::search(&config, &word)?,
        },
        Command::Export { output } => cli::export::export(&config, output.as_deref())?,
        Command::Stats => cli::stats::stats(&config)?,
        Command::Model { action } => match action {
            ModelAction::Download => cli::model_download(&config.embedding).await?,
        },
    }

    Ok(())
}
