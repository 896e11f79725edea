pub mod chunker;
pub mod config;
pub mod error;
pub mod extractor;
pub mod flashcard;
pub mod models;
pub mod processor;
pub mod uploader;
pub mod utils;

pub use chunker::TextChunker;
pub use config::Config;
pub use error::{IngestError, Result};
pub use flashcard::{parse_flashcards, Flashcard};
pub use models::{DocumentFormat, UploadedDocument};
pub use processor::DocumentProcessor;
pub use uploader::DocumentUploader;
