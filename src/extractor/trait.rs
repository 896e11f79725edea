use crate::error::Result;
use std::path::Path;

/// Trait for text extractors that turn one document format into plain text
#[async_trait::async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract the full text content of a file
    async fn extract(&self, path: &Path) -> Result<String>;

    /// Check if this extractor handles the given file extension
    fn supports_extension(&self, ext: &str) -> bool;
}
