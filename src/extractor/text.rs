use crate::error::{IngestError, Result};
use crate::extractor::r#trait::TextExtractor;
use std::path::Path;

/// Plain text and markdown extractor
///
/// Files are decoded as UTF-8; anything that is not valid UTF-8 is re-read
/// as Latin-1, where every byte maps to exactly one character.
pub struct PlainTextExtractor;

impl PlainTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PlainTextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

#[async_trait::async_trait]
impl TextExtractor for PlainTextExtractor {
    async fn extract(&self, path: &Path) -> Result<String> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| IngestError::extraction(path, "text", e))?;

        match String::from_utf8(bytes) {
            Ok(text) => Ok(text),
            Err(e) => {
                tracing::debug!(path = %path.display(), "not valid UTF-8, decoding as Latin-1");
                Ok(decode_latin1(e.as_bytes()))
            }
        }
    }

    fn supports_extension(&self, ext: &str) -> bool {
        matches!(ext.to_lowercase().as_str(), "txt" | "md")
    }
}
