//! Greedy sentence windowing with trailing overlap.

use async_trait::async_trait;

use crate::pipeline::Transform;
use crate::types::{Chunk, DataRecord, DataflowError};

/// Maximum length of a chunk's `summary_hint`, in chars.
const SUMMARY_HINT_MAX_CHARS: usize = 320;

/// Configuration for [`ChunkingTransform`].
#[derive(Clone, Copy, Debug)]
pub struct ChunkingConfig {
    /// Word-count budget per chunk. A window closes before the sentence that
    /// would push it over this budget.
    pub target_words: usize,
    /// Fraction of a chunk's sentences re-used at the start of the next
    /// window. Must be in `[0, 1)`.
    pub overlap_ratio: f64,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            target_words: 250,
            overlap_ratio: 0.15,
        }
    }
}

impl ChunkingConfig {
    /// Reject parameter combinations that could stall or degenerate the
    /// windowing loop.
    pub fn validate(&self) -> Result<(), DataflowError> {
        if self.target_words == 0 {
            return Err(DataflowError::Config(
                "chunking target_words must be at least 1".into(),
            ));
        }
        if !(0.0..1.0).contains(&self.overlap_ratio) {
            return Err(DataflowError::Config(format!(
                "chunking overlap_ratio must be in [0, 1), got {}",
                self.overlap_ratio
            )));
        }
        Ok(())
    }
}

/// Groups a record's sentence list into overlapping, word-bounded chunks.
///
/// Windowing is greedy: sentences are accumulated until the next one would
/// exceed the word budget, then the window is emitted and the cursor rewinds
/// by the overlap. A sentence larger than the whole budget still becomes its
/// own chunk; sentences are never split. The cursor advances by at least one
/// sentence per emitted chunk, so a list of `N` sentences produces at most
/// `N` chunks.
///
/// Emitted records carry ids suffixed `__0`, `__1`, ... in emission order,
/// with the parent record's metadata.
pub struct ChunkingTransform {
    config: ChunkingConfig,
}

impl ChunkingTransform {
    /// Create a transform after validating the configuration.
    pub fn new(config: ChunkingConfig) -> Result<Self, DataflowError> {
        config.validate()?;
        Ok(Self { config })
    }

    fn chunk(&self, sentences: &[String]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut i = 0;

        while i < sentences.len() {
            let start = i;
            let mut words = 0usize;
            while i < sentences.len() {
                let sentence_words = sentences[i].split_whitespace().count();
                // Close the window before exceeding the budget, unless it is
                // still empty: at least one sentence always goes in.
                if words + sentence_words > self.config.target_words && words > 0 {
                    break;
                }
                words += sentence_words;
                i += 1;
            }

            let end = i;
            let slice = &sentences[start..end];
            if slice.is_empty() {
                break;
            }

            chunks.push(Chunk {
                text: slice.join(" "),
                summary_hint: summary_hint(slice),
            });

            let overlap = if self.config.overlap_ratio == 0.0 {
                0
            } else {
                ((slice.len() as f64 * self.config.overlap_ratio).round() as usize).max(1)
            };
            // Rewind by the overlap, but always past `start` so the cursor
            // strictly advances even when the overlap would stall it.
            i = (start + 1).max(end.saturating_sub(overlap));
        }

        chunks
    }
}

impl Default for ChunkingTransform {
    fn default() -> Self {
        Self {
            config: ChunkingConfig::default(),
        }
    }
}

/// First two sentences of the slice, joined by a space and truncated to
/// [`SUMMARY_HINT_MAX_CHARS`] chars.
fn summary_hint(slice: &[String]) -> String {
    let head = slice[..slice.len().min(2)].join(" ");
    if head.chars().count() <= SUMMARY_HINT_MAX_CHARS {
        head
    } else {
        head.chars().take(SUMMARY_HINT_MAX_CHARS).collect()
    }
}

#[async_trait]
impl Transform for ChunkingTransform {
    type Input = Vec<String>;
    type Output = Chunk;

    fn name(&self) -> &'static str {
        "Chunking"
    }

    async fn process(
        &self,
        record: DataRecord<Vec<String>>,
    ) -> Result<Vec<DataRecord<Chunk>>, DataflowError> {
        let chunks = self.chunk(&record.data);
        tracing::debug!(record = %record.id, chunks = chunks.len(), "chunked document");
        Ok(chunks
            .into_iter()
            .enumerate()
            .map(|(index, chunk)| record.child(index, chunk))
            .collect())
    }
}
