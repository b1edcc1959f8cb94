//! Serialized record shape shared by every sink.
//!
//! The destination store ingests newline-delimited JSON documents with a
//! sanitized id, a small structured preview, and the chunk text carried as
//! base64 bytes. Both sinks serialize through this one type so local dry-run
//! output and uploaded batches are byte-identical for the same chunks.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

use crate::types::{Chunk, DataRecord};

/// One line of the ingestion file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndexRecord {
    /// Record id with every non-`[A-Za-z0-9_]` char replaced by `_`.
    pub id: String,
    #[serde(rename = "structData")]
    pub struct_data: StructData,
    pub content: RecordContent,
}

/// Structured fields the store indexes directly.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StructData {
    /// Originating file name, `"unknown"` when the source recorded none.
    pub source: String,
    pub summary_hint: String,
}

/// The chunk text payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordContent {
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    /// Base64 of the chunk text.
    #[serde(rename = "rawBytes")]
    pub raw_bytes: String,
}

impl IndexRecord {
    /// Build the wire record for one chunk.
    pub fn from_chunk(record: &DataRecord<Chunk>) -> Self {
        Self {
            id: sanitize_id(&record.id),
            struct_data: StructData {
                source: record.file_name().unwrap_or("unknown").to_string(),
                summary_hint: record.data.summary_hint.clone(),
            },
            content: RecordContent {
                mime_type: "text/plain".to_string(),
                raw_bytes: BASE64.encode(record.data.text.as_bytes()),
            },
        }
    }

    /// Decode the base64 payload back into chunk text. Used by tests and
    /// operators inspecting sink output.
    pub fn decode_text(&self) -> Result<String, base64::DecodeError> {
        let bytes = BASE64.decode(&self.content.raw_bytes)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// The destination store only accepts `[A-Za-z0-9_]` in document ids.
fn sanitize_id(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}
