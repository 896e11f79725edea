use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use studywise::{
    config::Config, flashcard, models::UploadedDocument, utils, DocumentUploader,
};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "studywise")]
#[command(about = "Turn study material into text chunks ready for flashcard generation")]
#[command(version)]
struct Cli {
    /// Config file (defaults to config/settings.toml, then ~/.config/studywise/settings.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Maximum upload size in megabytes (overrides config)
    #[arg(long, global = true)]
    max_size_mb: Option<u64>,

    /// Print the ingested document as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a local document
    File {
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
    /// Download and ingest a document
    Url {
        #[arg(value_name = "URL")]
        url: String,
        /// Keep the downloaded file in this directory
        #[arg(long)]
        download_dir: Option<PathBuf>,
    },
    /// Ingest pasted text (read from stdin when omitted)
    Text {
        #[arg(value_name = "TEXT")]
        text: Option<String>,
        /// Display name for the text
        #[arg(long)]
        name: Option<String>,
    },
    /// List supported file extensions
    Formats,
    /// Attach document provenance to generated flashcards
    Cards {
        /// JSON array of flashcards
        #[arg(value_name = "JSON_FILE")]
        cards: PathBuf,
        /// Document the cards were generated from
        #[arg(long)]
        source: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let mut config = match &cli.config {
        Some(path) => {
            let mut config = Config::from_file(path)?;
            config.apply_env()?;
            config
        }
        None => Config::load()?,
    };
    if let Some(max_size_mb) = cli.max_size_mb {
        config.upload.max_file_size_mb = max_size_mb;
    }

    let uploader = DocumentUploader::from_config(&config)?;

    match cli.command {
        Commands::File { path } => {
            let doc = uploader.upload_from_file(&path).await?;
            print_document(&doc, cli.json)?;
        }
        Commands::Url { url, download_dir } => {
            let doc = uploader.upload_from_url(&url, download_dir.as_deref()).await?;
            print_document(&doc, cli.json)?;
        }
        Commands::Text { text, name } => {
            let text = match text {
                Some(text) => text,
                None => {
                    let mut buf = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buf)
                        .context("Failed to read text from stdin")?;
                    buf
                }
            };
            let doc = uploader.upload_from_text(&text, name.as_deref())?;
            print_document(&doc, cli.json)?;
        }
        Commands::Formats => {
            let formats = uploader.get_supported_formats();
            if cli.json {
                println!("{}", serde_json::to_string(&formats)?);
            } else {
                for format in formats {
                    println!("{}", format);
                }
            }
        }
        Commands::Cards { cards, source } => {
            let raw = std::fs::read_to_string(&cards)
                .with_context(|| format!("Failed to read flashcards: {}", cards.display()))?;
            let doc = uploader.upload_from_file(&source).await?;
            let provenance = doc.provenance();

            let stamped: Vec<_> = flashcard::parse_flashcards(&raw)?
                .into_iter()
                .map(|card| card.with_provenance(&provenance))
                .collect();
            println!("{}", serde_json::to_string_pretty(&stamped)?);
        }
    }

    Ok(())
}

fn print_document(doc: &UploadedDocument, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(doc)?);
        return Ok(());
    }

    println!("File: {}", doc.file_name);
    println!("Type: {}", doc.file_type);
    println!(
        "Size: {} characters ({:.2} MB)",
        doc.content.chars().count(),
        utils::bytes_to_mb(doc.content.len() as u64)
    );
    println!("Chunks: {}", doc.chunks.len());
    for (i, chunk) in doc.chunks.iter().enumerate() {
        let preview: String = chunk.chars().take(80).collect();
        println!("  {}. {}", i + 1, preview.replace('\n', " "));
    }
    Ok(())
}
