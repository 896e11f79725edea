use crate::error::IngestError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::SystemTime;

/// Document formats accepted by the uploader
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Doc,
    Txt,
    Md,
    Pptx,
    Ppt,
}

/// Extension and MIME type for every supported format, in display order
const FORMAT_TABLE: &[(DocumentFormat, &str, &str)] = &[
    (DocumentFormat::Pdf, "pdf", "application/pdf"),
    (
        DocumentFormat::Docx,
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    (DocumentFormat::Doc, "doc", "application/msword"),
    (DocumentFormat::Txt, "txt", "text/plain"),
    (DocumentFormat::Md, "md", "text/markdown"),
    (
        DocumentFormat::Pptx,
        "pptx",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    ),
    (DocumentFormat::Ppt, "ppt", "application/vnd.ms-powerpoint"),
];

impl DocumentFormat {
    /// All supported formats in table order
    pub fn all() -> impl Iterator<Item = DocumentFormat> {
        FORMAT_TABLE.iter().map(|(format, _, _)| *format)
    }

    /// Resolve a file extension; case-insensitive, a leading dot is ignored
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim_start_matches('.').to_lowercase();
        FORMAT_TABLE
            .iter()
            .find(|(_, e, _)| *e == ext)
            .map(|(format, _, _)| *format)
    }

    /// Resolve a declared content type, ignoring parameters such as charset
    pub fn from_mime(content_type: &str) -> Option<Self> {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_lowercase();
        FORMAT_TABLE
            .iter()
            .find(|(_, _, m)| *m == mime)
            .map(|(format, _, _)| *format)
    }

    pub fn extension(&self) -> &'static str {
        self.entry().1
    }

    pub fn mime_type(&self) -> &'static str {
        self.entry().2
    }

    fn entry(&self) -> &'static (DocumentFormat, &'static str, &'static str) {
        FORMAT_TABLE
            .iter()
            .find(|(format, _, _)| format == self)
            .unwrap_or(&FORMAT_TABLE[0])
    }

    /// Build the error reported for a value outside the supported set
    pub fn unsupported(value: &str) -> IngestError {
        let format = if value.is_empty() { "unknown" } else { value };
        IngestError::UnsupportedFormat {
            format: format.to_string(),
            supported: supported_extensions().join(", "),
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Extensions of every supported format
pub fn supported_extensions() -> Vec<&'static str> {
    FORMAT_TABLE.iter().map(|(_, ext, _)| *ext).collect()
}

/// A document taken in through one of the intake modes, ready for flashcard generation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadedDocument {
    /// Original file name, URL basename, or caller-supplied label
    pub file_name: String,
    pub file_type: DocumentFormat,
    pub upload_date: SystemTime,
    /// Full extracted text
    pub content: String,
    /// Overlapping windows of `content`, in order
    pub chunks: Vec<String>,
}

impl UploadedDocument {
    /// Create a new document stamped with the current time
    pub fn new(
        file_name: impl Into<String>,
        file_type: DocumentFormat,
        content: String,
        chunks: Vec<String>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            file_type,
            upload_date: SystemTime::now(),
            content,
            chunks,
        }
    }

    /// Metadata stamped onto flashcards generated from this document
    pub fn provenance(&self) -> Provenance {
        Provenance {
            source_document: self.file_name.clone(),
            document_type: self.file_type,
        }
    }
}

/// Where a generated flashcard came from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Provenance {
    pub source_document: String,
    pub document_type: DocumentFormat,
}
