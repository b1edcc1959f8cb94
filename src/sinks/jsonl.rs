//! Local newline-delimited JSON sink.

use std::path::PathBuf;

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::pipeline::{RecordStream, Sink};
use crate::sinks::record::IndexRecord;
use crate::types::{Chunk, DataflowError};

/// Writes one serialized [`IndexRecord`] per line to a local file.
///
/// The output file is truncated on open and fully flushed before `write`
/// returns. Intended for dry runs and for inspecting exactly what a remote
/// import would receive.
pub struct JsonLineSink {
    output_path: PathBuf,
}

impl JsonLineSink {
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
        }
    }

    /// Destination path of the serialized records.
    pub fn output_path(&self) -> &std::path::Path {
        &self.output_path
    }
}

#[async_trait]
impl Sink for JsonLineSink {
    type Item = Chunk;

    fn name(&self) -> &'static str {
        "JsonLineSink"
    }

    async fn write(&self, mut records: RecordStream<Chunk>) -> Result<(), DataflowError> {
        let file = tokio::fs::File::create(&self.output_path).await?;
        let mut writer = BufWriter::new(file);

        let mut written = 0usize;
        while let Some(record) = records.next().await {
            let record = record?;
            let line = serde_json::to_string(&IndexRecord::from_chunk(&record))?;
            writer.write_all(line.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            written += 1;
        }
        writer.flush().await?;

        tracing::info!(
            records = written,
            path = %self.output_path.display(),
            "wrote chunk records"
        );
        Ok(())
    }
}
