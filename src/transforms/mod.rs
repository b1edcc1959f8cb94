//! Intermediate pipeline stages.
//!
//! * [`SentenceSplitter`] — raw document text to an ordered sentence list.
//! * [`ChunkingTransform`] — sentence lists to overlapping, word-bounded
//!   [`Chunk`](crate::types::Chunk) records.

pub mod chunking;
pub mod sentence;

pub use chunking::{ChunkingConfig, ChunkingTransform};
pub use sentence::SentenceSplitter;
