//! Character-window text splitter with overlap.

use serde::{Deserialize, Serialize};

/// A piece of a document's text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextChunk {
    pub text: String,
    /// Character offset of the window start in the source text.
    pub start_offset: usize,
    pub chunk_index: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
        }
    }

    /// Splits into windows of at most `chunk_size` characters.
    ///
    /// A window is cut at the last sentence end or, failing that, the last
    /// whitespace in its final fifth; the next window starts `chunk_overlap`
    /// characters before the cut.
    pub fn split(&self, text: &str) -> Vec<TextChunk> {
        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < total {
            let end = (start + self.chunk_size).min(total);
            let cut = if end < total {
                find_boundary(&chars, start, end)
            } else {
                end
            };

            let piece: String = chars[start..cut].iter().collect();
            let trimmed = piece.trim();
            if !trimmed.is_empty() {
                chunks.push(TextChunk {
                    text: trimmed.to_string(),
                    start_offset: start,
                    chunk_index: chunks.len(),
                });
            }

            if cut >= total {
                break;
            }
            start = cut.saturating_sub(self.chunk_overlap).max(start + 1);
        }

        chunks
    }
}

fn find_boundary(chars: &[char], start: usize, end: usize) -> usize {
    let search_start = start + (end - start) * 4 / 5;

    let sentence_end = (search_start..end).rev().find(|&i| {
        matches!(chars[i], '.' | '!' | '?' | '\n')
            && chars.get(i + 1).map(|c| c.is_whitespace()).unwrap_or(true)
    });
    if let Some(i) = sentence_end {
        return i + 1;
    }

    (search_start..end)
        .rev()
        .find(|&i| chars[i].is_whitespace())
        .map(|i| i + 1)
        .unwrap_or(end)
}
