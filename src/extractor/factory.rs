use crate::extractor::{
    PdfExtractor, PlainTextExtractor, SlideDeckExtractor, TextExtractor, WordDocExtractor,
};
use crate::models::DocumentFormat;
use std::sync::Arc;

/// The four extraction strategies; several formats share one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractorKind {
    PlainText,
    Pdf,
    WordDoc,
    SlideDeck,
}

impl ExtractorKind {
    /// Static mapping from document format to extraction strategy
    pub fn for_format(format: DocumentFormat) -> Self {
        match format {
            DocumentFormat::Txt | DocumentFormat::Md => Self::PlainText,
            DocumentFormat::Pdf => Self::Pdf,
            DocumentFormat::Docx | DocumentFormat::Doc => Self::WordDoc,
            DocumentFormat::Pptx | DocumentFormat::Ppt => Self::SlideDeck,
        }
    }
}

/// Factory for creating TextExtractor instances
pub struct ExtractorFactory;

impl ExtractorFactory {
    /// Create the extractor for a document format
    pub fn create_for_format(format: DocumentFormat) -> Arc<dyn TextExtractor> {
        Self::create(ExtractorKind::for_format(format))
    }

    pub fn create(kind: ExtractorKind) -> Arc<dyn TextExtractor> {
        match kind {
            ExtractorKind::PlainText => Arc::new(PlainTextExtractor::new()),
            ExtractorKind::Pdf => Arc::new(PdfExtractor::new()),
            ExtractorKind::WordDoc => Arc::new(WordDocExtractor::new()),
            ExtractorKind::SlideDeck => Arc::new(SlideDeckExtractor::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_format_has_an_extractor() {
        for format in DocumentFormat::all() {
            let extractor = ExtractorFactory::create_for_format(format);
            assert!(
                extractor.supports_extension(format.extension()),
                "no extractor claims {}",
                format
            );
        }
    }

    #[test]
    fn test_shared_strategies() {
        assert_eq!(ExtractorKind::for_format(DocumentFormat::Md), ExtractorKind::PlainText);
        assert_eq!(ExtractorKind::for_format(DocumentFormat::Doc), ExtractorKind::WordDoc);
        assert_eq!(ExtractorKind::for_format(DocumentFormat::Ppt), ExtractorKind::SlideDeck);
        assert_eq!(ExtractorKind::for_format(DocumentFormat::Pdf), ExtractorKind::Pdf);
    }

    #[test]
    fn test_factory_pdf_extractor() {
        let extractor = ExtractorFactory::create(ExtractorKind::Pdf);
        assert!(extractor.supports_extension("pdf"));
        assert!(!extractor.supports_extension("docx"));
    }
}
