pub mod docx;
pub mod factory;
pub mod pdf;
pub mod pptx;
pub mod text;
pub mod r#trait;

pub use docx::WordDocExtractor;
pub use factory::{ExtractorFactory, ExtractorKind};
pub use pdf::PdfExtractor;
pub use pptx::SlideDeckExtractor;
pub use r#trait::TextExtractor;
pub use text::PlainTextExtractor;
