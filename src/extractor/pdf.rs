use crate::error::{IngestError, Result};
use crate::extractor::r#trait::TextExtractor;
use std::path::{Path, PathBuf};

/// PDF text extractor
///
/// Text is pulled page by page with lopdf and pages are joined by a blank
/// line. If lopdf cannot decode a page, the whole file is re-read page by
/// page with pdf-extract instead.
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }

    fn extract_blocking(path: PathBuf) -> Result<String> {
        use lopdf::Document;

        let doc = Document::load(&path)
            .map_err(|e| IngestError::extraction(&path, "pdf", e.to_string()))?;

        let mut pages = Vec::new();
        for page_num in doc.get_pages().keys() {
            match doc.extract_text(&[*page_num]) {
                Ok(page_text) => pages.push(page_text),
                Err(e) => {
                    tracing::debug!(
                        path = %path.display(),
                        page = page_num,
                        error = %e,
                        "lopdf could not read page, falling back to pdf-extract"
                    );
                    return pdf_extract::extract_text_by_pages(&path)
                        .map(join_pages)
                        .map_err(|e| IngestError::extraction(&path, "pdf", e.to_string()));
                }
            }
        }

        Ok(join_pages(pages))
    }
}

/// Join page texts with a blank line, dropping each page's trailing whitespace
fn join_pages<I, S>(pages: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    pages
        .into_iter()
        .map(|page| page.as_ref().trim_end().to_string())
        .collect::<Vec<_>>()
        .join("\n\n")
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl TextExtractor for PdfExtractor {
    async fn extract(&self, path: &Path) -> Result<String> {
        let owned = path.to_path_buf();
        tokio::task::spawn_blocking(move || Self::extract_blocking(owned))
            .await
            .map_err(|e| IngestError::extraction(path, "pdf", e))?
    }

    fn supports_extension(&self, ext: &str) -> bool {
        matches!(ext.to_lowercase().as_str(), "pdf")
    }
}
