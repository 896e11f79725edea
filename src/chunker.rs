use crate::error::{IngestError, Result};
use std::ops::Range;

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Break points tried in order: paragraph, line, word.
/// When a window has none of them it is cut at the character limit.
const SEPARATORS: &[&str] = &["\n\n", "\n", " "];

/// Splits text into overlapping windows of at most `chunk_size` characters
///
/// Every chunk is a contiguous slice of the input. A window ends right after
/// the highest-ranked separator it contains; the next window starts at the
/// first word boundary inside the trailing `overlap` characters of the
/// previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextChunker {
    chunk_size: usize,
    overlap: usize,
}

impl TextChunker {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(IngestError::InvalidConfig(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if overlap >= chunk_size {
            return Err(IngestError::InvalidConfig(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                overlap, chunk_size
            )));
        }
        Ok(Self { chunk_size, overlap })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split `text` into owned chunks
    pub fn split(&self, text: &str) -> Vec<String> {
        self.split_spans(text)
            .into_iter()
            .map(|span| text[span].to_string())
            .collect()
    }

    /// Byte ranges of each chunk within `text`
    pub fn split_spans(&self, text: &str) -> Vec<Range<usize>> {
        if text.is_empty() {
            return Vec::new();
        }

        // Byte offset of every char plus the end of the text
        let offsets: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let total_chars = offsets.len() - 1;
        let char_at = |byte: usize| offsets.partition_point(|&o| o < byte);

        let mut spans = Vec::new();
        let mut start = 0usize; // char index
        let mut prev_end = 0usize; // char index

        loop {
            if total_chars - start <= self.chunk_size {
                spans.push(offsets[start]..text.len());
                break;
            }

            let limit = start + self.chunk_size;
            let floor = start.max(prev_end);
            let end = self
                .find_break(text, offsets[floor], offsets[limit])
                .map(char_at)
                .unwrap_or(limit);

            spans.push(offsets[start]..offsets[end]);
            prev_end = end;
            start = next_start(text, &offsets, start, end, self.overlap);
        }

        spans
    }

    /// Byte position right after the best separator in `text[lo..hi]`
    fn find_break(&self, text: &str, lo: usize, hi: usize) -> Option<usize> {
        let window = &text[lo..hi];
        SEPARATORS
            .iter()
            .find_map(|sep| window.rfind(sep).map(|i| lo + i + sep.len()))
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

/// First word boundary within the trailing `overlap` chars of `[start, end)`
fn next_start(text: &str, offsets: &[usize], start: usize, end: usize, overlap: usize) -> usize {
    let lo = end.saturating_sub(overlap).max(start + 1);
    (lo..end)
        .find(|&i| {
            text[..offsets[i]]
                .chars()
                .next_back()
                .is_some_and(char::is_whitespace)
        })
        .unwrap_or(end)
}
