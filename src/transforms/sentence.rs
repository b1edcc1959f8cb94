//! Paragraph-respecting sentence splitting.

use async_trait::async_trait;
use regex::Regex;

use crate::pipeline::Transform;
use crate::types::{DataRecord, DataflowError};

/// Splits a document's raw text into an ordered sequence of sentences.
///
/// The split is a deliberate heuristic, not a sentence-boundary detector:
/// line endings are normalized, the text is cut into paragraphs at blank-line
/// boundaries, and each paragraph is cut immediately after a `.`, `!` or `?`
/// that is followed by whitespace. No abbreviation handling, no quote
/// awareness. Downstream chunk boundaries depend on this exact behavior
/// staying stable.
///
/// One input record always yields exactly one output record carrying the
/// sentence list (possibly empty), with id and metadata preserved.
pub struct SentenceSplitter {
    paragraph_boundary: Regex,
}

impl SentenceSplitter {
    pub fn new() -> Self {
        Self {
            // One or more newlines with only whitespace between them.
            paragraph_boundary: Regex::new(r"\n\s*\n+").expect("paragraph boundary regex"),
        }
    }

    /// Split the full document text into sentences, paragraph by paragraph.
    fn split(&self, text: &str) -> Vec<String> {
        let normalized = text.replace("\r\n", "\n");
        self.paragraph_boundary
            .split(&normalized)
            .map(str::trim)
            .filter(|paragraph| !paragraph.is_empty())
            .flat_map(split_paragraph)
            .collect()
    }
}

impl Default for SentenceSplitter {
    fn default() -> Self {
        Self::new()
    }
}

/// Cut one paragraph at every `[.!?]` + whitespace boundary.
///
/// The whitespace run acts as the separator and is dropped; pieces are
/// trimmed and empties discarded. Equivalent to splitting on the lookbehind
/// pattern `(?<=[.!?])\s+`, which the `regex` crate cannot express directly.
fn split_paragraph(paragraph: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = paragraph.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        if !matches!(ch, '.' | '!' | '?') {
            continue;
        }
        let Some(&(_, next)) = chars.peek() else {
            continue;
        };
        if !next.is_whitespace() {
            continue;
        }

        push_trimmed(&mut sentences, &paragraph[start..idx + ch.len_utf8()]);
        start = paragraph.len();
        while let Some(&(ws_idx, ws)) = chars.peek() {
            if ws.is_whitespace() {
                chars.next();
            } else {
                start = ws_idx;
                break;
            }
        }
    }

    if start < paragraph.len() {
        push_trimmed(&mut sentences, &paragraph[start..]);
    }
    sentences
}

fn push_trimmed(sentences: &mut Vec<String>, piece: &str) {
    let piece = piece.trim();
    if !piece.is_empty() {
        sentences.push(piece.to_string());
    }
}

#[async_trait]
impl Transform for SentenceSplitter {
    type Input = String;
    type Output = Vec<String>;

    fn name(&self) -> &'static str {
        "SentenceSplitter"
    }

    async fn process(
        &self,
        record: DataRecord<String>,
    ) -> Result<Vec<DataRecord<Vec<String>>>, DataflowError> {
        let sentences = self.split(&record.data);
        tracing::debug!(record = %record.id, sentences = sentences.len(), "split document");
        Ok(vec![record.map(sentences)])
    }
}
