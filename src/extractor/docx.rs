use crate::error::{IngestError, Result};
use crate::extractor::r#trait::TextExtractor;
use crate::utils;
use docx_rs::{DocumentChild, Paragraph, ParagraphChild, Run, RunChild};
use std::path::{Path, PathBuf};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Word-processor document extractor (docx, and doc by extension)
///
/// Paragraphs are read in document order and joined by a blank line.
pub struct WordDocExtractor;

impl WordDocExtractor {
    pub fn new() -> Self {
        Self
    }

    fn extract_blocking(path: &Path) -> std::result::Result<String, BoxError> {
        let bytes = std::fs::read(path)?;
        let docx = docx_rs::read_docx(&bytes).map_err(|e| format!("docx parse error: {:?}", e))?;

        let paragraphs: Vec<String> = docx
            .document
            .children
            .iter()
            .filter_map(|child| match child {
                DocumentChild::Paragraph(paragraph) => Some(paragraph_text(paragraph)),
                _ => None,
            })
            .collect();
        Ok(paragraphs.join("\n\n"))
    }
}

impl Default for WordDocExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Text of every run in a paragraph, concatenated
fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut text = String::new();
    for child in &paragraph.children {
        if let ParagraphChild::Run(run) = child {
            push_run_text(&mut text, run);
        }
    }
    text
}

fn push_run_text(out: &mut String, run: &Run) {
    for child in &run.children {
        match child {
            RunChild::Text(t) => out.push_str(&t.text),
            RunChild::Tab(_) => out.push('\t'),
            RunChild::Break(_) => out.push('\n'),
            _ => {}
        }
    }
}

#[async_trait::async_trait]
impl TextExtractor for WordDocExtractor {
    async fn extract(&self, path: &Path) -> Result<String> {
        let format = utils::get_extension(path).unwrap_or_else(|| "docx".to_string());
        let owned: PathBuf = path.to_path_buf();
        tokio::task::spawn_blocking(move || Self::extract_blocking(&owned))
            .await
            .map_err(|e| IngestError::extraction(path, &format, e))?
            .map_err(|e| IngestError::extraction(path, &format, e))
    }

    fn supports_extension(&self, ext: &str) -> bool {
        matches!(ext.to_lowercase().as_str(), "docx" | "doc")
    }
}
