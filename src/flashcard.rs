use crate::models::{DocumentFormat, Provenance};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_LEVEL: &str = "beginner";

/// A question/answer card generated from a document's chunks
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Flashcard {
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_document: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_type: Option<DocumentFormat>,
}

fn default_level() -> String {
    DEFAULT_LEVEL.to_string()
}

impl Flashcard {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            tags: Vec::new(),
            level: default_level(),
            source_document: None,
            document_type: None,
        }
    }

    /// Stamp the card with the document it was generated from
    pub fn with_provenance(mut self, provenance: &Provenance) -> Self {
        self.source_document = Some(provenance.source_document.clone());
        self.document_type = Some(provenance.document_type);
        self
    }
}

/// Parse a JSON array of cards as returned by a generation model
///
/// The array may be wrapped in a markdown code fence.
pub fn parse_flashcards(response: &str) -> Result<Vec<Flashcard>> {
    let body = strip_code_fence(response);
    serde_json::from_str(body).context("Failed to parse flashcard JSON")
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. `json`) on the opening line
    let inner = match inner.find('\n') {
        Some(newline) => &inner[newline + 1..],
        None => inner,
    };
    inner.trim_end().trim_end_matches("```").trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flashcards_defaults() {
        let json = r#"[
            {"question": "What is ATP?", "answer": "The cell's energy currency", "tags": ["biology"]},
            {"question": "What is a gene?", "answer": "A unit of heredity", "level": "advanced"}
        ]"#;

        let cards = parse_flashcards(json).unwrap();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].tags, vec!["biology"]);
        assert_eq!(cards[0].level, "beginner");
        assert!(cards[1].tags.is_empty());
        assert_eq!(cards[1].level, "advanced");
        assert_eq!(cards[1].source_document, None);
    }

    #[test]
    fn test_parse_flashcards_code_fence() {
        let response = "```json\n[{\"question\": \"Q\", \"answer\": \"A\"}]\n```\n";
        let cards = parse_flashcards(response).unwrap();
        assert_eq!(cards, vec![Flashcard::new("Q", "A")]);
    }

    #[test]
    fn test_parse_flashcards_invalid() {
        assert!(parse_flashcards("Sorry, I cannot help with that.").is_err());
        assert!(parse_flashcards(r#"[{"question": "missing answer"}]"#).is_err());
    }

    #[test]
    fn test_with_provenance() {
        let provenance = Provenance {
            source_document: "cells.pdf".to_string(),
            document_type: DocumentFormat::Pdf,
        };
        let card = Flashcard::new("Q", "A").with_provenance(&provenance);
        assert_eq!(card.source_document.as_deref(), Some("cells.pdf"));
        assert_eq!(card.document_type, Some(DocumentFormat::Pdf));

        let json = serde_json::to_value(&card).unwrap();
        assert_eq!(json["document_type"], "pdf");
        assert_eq!(json["level"], "beginner");
    }
}
