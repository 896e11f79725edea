use crate::chunker::TextChunker;
use crate::error::{IngestError, Result};
use crate::extractor::ExtractorFactory;
use crate::models::DocumentFormat;
use crate::utils;
use std::path::Path;

/// Turns files into text and text into chunks
#[derive(Debug, Clone, Default)]
pub struct DocumentProcessor {
    chunker: TextChunker,
}

impl DocumentProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chunker(chunker: TextChunker) -> Self {
        Self { chunker }
    }

    /// Extract the text of a document using the extractor for its extension
    ///
    /// The extractor's output is returned unmodified; its errors propagate.
    pub async fn process_document(&self, path: &Path) -> Result<String> {
        if !path.exists() {
            return Err(IngestError::NotFound(path.to_path_buf()));
        }

        let extension = utils::get_extension(path).unwrap_or_default();
        let format = DocumentFormat::from_extension(&extension)
            .ok_or_else(|| DocumentFormat::unsupported(&extension))?;

        tracing::debug!(path = %path.display(), %format, "extracting text");
        ExtractorFactory::create_for_format(format).extract(path).await
    }

    /// Split text into overlapping chunks
    pub fn chunk_text(&self, text: &str) -> Vec<String> {
        self.chunker.split(text)
    }
}
