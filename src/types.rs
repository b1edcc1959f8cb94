//! Core types shared by every pipeline stage.
//!
//! The central type is [`DataRecord`], the envelope that flows between
//! stages: a stable id, a stage-specific payload, and an open metadata map
//! that travels with the record from source to sink. Payloads change shape
//! as records move through the pipeline (raw text, sentence list, [`Chunk`]),
//! but the envelope contract stays the same.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Open metadata attached to a record (originating path, file name, ...).
///
/// Keys are free-form; transforms propagate the map unchanged unless they
/// have a reason to override it.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Metadata key for the full path of the originating file.
pub const META_FILE_PATH: &str = "filePath";
/// Metadata key for the bare file name of the originating file.
pub const META_FILE_NAME: &str = "fileName";
/// Metadata key for the extension of the originating file.
pub const META_EXTENSION: &str = "extension";

/// A uniquely identified unit of data flowing through a pipeline.
///
/// Ids are assigned by the source and must never be empty. Downstream
/// transforms either pass an id through unchanged (1:1 stages) or extend it
/// with a stable `__{index}` suffix (expanding stages), so every emitted
/// record stays traceable to its originating document.
#[derive(Clone, Debug, PartialEq)]
pub struct DataRecord<T> {
    /// Unique id within one pipeline run.
    pub id: String,
    /// Stage-specific payload.
    pub data: T,
    /// Open metadata, propagated from the source.
    pub metadata: Metadata,
}

impl<T> DataRecord<T> {
    /// Create a record with empty metadata.
    pub fn new(id: impl Into<String>, data: T) -> Self {
        Self {
            id: id.into(),
            data,
            metadata: Metadata::new(),
        }
    }

    /// Attach metadata to the record.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Build a derived record that keeps this record's id and metadata but
    /// carries a new payload. Used by 1:1 transforms.
    pub fn map<U>(self, data: U) -> DataRecord<U> {
        DataRecord {
            id: self.id,
            data,
            metadata: self.metadata,
        }
    }

    /// Build a child record with the id extended by a `__{index}` suffix.
    /// Used by expanding transforms so chunk ids stay derivable from their
    /// parent document.
    pub fn child<U>(&self, index: usize, data: U) -> DataRecord<U> {
        DataRecord {
            id: format!("{}__{index}", self.id),
            data,
            metadata: self.metadata.clone(),
        }
    }

    /// The `fileName` metadata entry, when the source recorded one.
    pub fn file_name(&self) -> Option<&str> {
        self.metadata.get(META_FILE_NAME).and_then(|v| v.as_str())
    }
}

/// A bounded span of concatenated sentences plus a short preview hint;
/// the unit ultimately stored in the retrieval corpus.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Contiguous sentence run joined by single spaces.
    pub text: String,
    /// First two sentences of the run, truncated to at most 320 chars.
    /// Always a prefix of `text`; a cheap content preview, not a summary.
    pub summary_hint: String,
}

/// Errors surfaced by pipeline stages.
///
/// No stage swallows errors and the pipeline never retries: the first error
/// aborts the whole run. Documentation ingestion is a low-frequency,
/// operator-triggered batch job, so fail-loud is the contract.
#[derive(Debug, Error)]
pub enum DataflowError {
    /// Invalid or incomplete configuration, detected before any stage runs.
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem failure (unreadable file, failed write).
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// HTTP-level failure talking to the remote document store.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// External transfer or credential command failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// The remote import trigger was rejected.
    #[error("import request failed with status {status}: {body}")]
    Import { status: u16, body: String },
}
