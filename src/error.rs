use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while taking a document in and turning it into chunks.
///
/// Every variant is terminal for the call that produced it; nothing in the
/// ingestion pipeline retries.
#[derive(Error, Debug)]
pub enum IngestError {
    /// The referenced local file does not exist
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Extension or content type outside the supported set
    #[error("unsupported file format: {format}. Supported formats: {supported}")]
    UnsupportedFormat { format: String, supported: String },

    /// File size (declared or streamed) exceeds the configured cap
    #[error("{}", size_limit_message(.size_mb, .limit_mb))]
    SizeLimit { size_mb: Option<f64>, limit_mb: u64 },

    /// URL without a scheme or a host
    #[error("invalid URL: {url} ({reason})")]
    InvalidUrl { url: String, reason: String },

    /// Non-success status or transport failure while downloading
    #[error("failed to download {url}: {reason}")]
    Connection { url: String, reason: String },

    /// A format library could not parse the file
    #[error("failed to extract text from {format} file {}: {source}", .path.display())]
    Extraction {
        path: PathBuf,
        format: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Pasted text was empty
    #[error("text content cannot be empty")]
    EmptyInput,

    /// Chunking parameters that cannot produce chunks
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

fn size_limit_message(size_mb: &Option<f64>, limit_mb: &u64) -> String {
    match size_mb {
        Some(size) => format!(
            "file size ({:.2} MB) exceeds the maximum allowed size ({} MB)",
            size, limit_mb
        ),
        None => format!("file size exceeds the maximum allowed size ({} MB)", limit_mb),
    }
}

impl IngestError {
    /// Wrap a format library failure with the file and format it came from.
    pub fn extraction<E>(path: impl Into<PathBuf>, format: &str, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Extraction {
            path: path.into(),
            format: format.to_string(),
            source: source.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
