//! Remote document-store sink: stage, upload, trigger import.

use std::path::PathBuf;

use async_trait::async_trait;
use futures_util::StreamExt;
use serde_json::json;
use uuid::Uuid;

use crate::pipeline::{RecordStream, Sink};
use crate::sinks::record::IndexRecord;
use crate::transport::Transport;
use crate::types::{Chunk, DataflowError};

/// Default API host of the destination document store.
pub const DEFAULT_DISCOVERY_HOST: &str = "https://us-discoveryengine.googleapis.com";

/// Ships the chunk stream to a remote data store.
///
/// The store imports from bucket files, so this sink cannot stream records
/// one at a time: it buffers every serialized line, stages them into a
/// uniquely named temp file, uploads that file via the injected
/// [`Transport`], then POSTs the store's `:import` trigger with incremental
/// reconciliation.
///
/// The staged file is removed only after both the upload and the import
/// trigger succeed. On failure it stays behind (its path is logged at upload
/// time) so an operator can inspect or re-drive the batch by hand.
pub struct DiscoveryEngineSink<T: Transport> {
    bucket_uri: String,
    data_store: String,
    host: String,
    staging_dir: PathBuf,
    transport: T,
    client: reqwest::Client,
}

impl<T: Transport> DiscoveryEngineSink<T> {
    /// Create a sink targeting `bucket_uri` and the data-store resource path
    /// used in the import URL, with [`DEFAULT_DISCOVERY_HOST`].
    pub fn new(
        bucket_uri: impl Into<String>,
        data_store: impl Into<String>,
        transport: T,
    ) -> Self {
        Self {
            bucket_uri: bucket_uri.into(),
            data_store: data_store.into(),
            host: DEFAULT_DISCOVERY_HOST.to_string(),
            staging_dir: std::env::temp_dir(),
            transport,
            client: reqwest::Client::new(),
        }
    }

    /// Override the API host (regional endpoints, test servers).
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Override where the batch file is staged before upload.
    #[must_use]
    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = dir.into();
        self
    }

    async fn trigger_import(&self) -> Result<(), DataflowError> {
        let url = format!("{}/v1/{}:import", self.host, self.data_store);
        let token = self.transport.access_token().await?;
        let body = json!({
            "gcsSource": { "inputUris": [self.bucket_uri] },
            "reconciliationMode": "INCREMENTAL",
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DataflowError::Import {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl<T: Transport> Sink for DiscoveryEngineSink<T> {
    type Item = Chunk;

    fn name(&self) -> &'static str {
        "DiscoveryEngineSink"
    }

    async fn write(&self, mut records: RecordStream<Chunk>) -> Result<(), DataflowError> {
        // The upload mechanism needs one complete file, so this is the one
        // place the pipeline buffers a whole batch.
        let mut lines = Vec::new();
        while let Some(record) = records.next().await {
            let record = record?;
            lines.push(serde_json::to_string(&IndexRecord::from_chunk(&record))?);
        }

        let staged = self
            .staging_dir
            .join(format!("docflow-chunks-{}.jsonl", Uuid::new_v4()));
        let mut payload = lines.join("\n");
        payload.push('\n');
        tokio::fs::write(&staged, payload).await?;

        tracing::info!(
            records = lines.len(),
            staged = %staged.display(),
            bucket = %self.bucket_uri,
            "uploading chunk batch"
        );
        self.transport.upload(&staged, &self.bucket_uri).await?;

        tracing::info!(data_store = %self.data_store, "triggering import");
        self.trigger_import().await?;

        // Cleanup is deliberately skipped on upload/import failure; the
        // staged file is the operator's recovery artifact.
        tokio::fs::remove_file(&staged).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DataRecord;
    use async_stream::try_stream;
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    pub(crate) struct FakeTransport {
        pub uploads: Arc<Mutex<Vec<(PathBuf, String)>>>,
        pub staged_contents: Arc<Mutex<Vec<String>>>,
        pub fail_upload: bool,
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn upload(&self, local: &Path, destination: &str) -> Result<(), DataflowError> {
            if self.fail_upload {
                return Err(DataflowError::Transport("upload refused".into()));
            }
            let contents = std::fs::read_to_string(local)?;
            self.staged_contents.lock().unwrap().push(contents);
            self.uploads
                .lock()
                .unwrap()
                .push((local.to_path_buf(), destination.to_string()));
            Ok(())
        }

        async fn access_token(&self) -> Result<String, DataflowError> {
            Ok("fake-token".to_string())
        }
    }

    fn chunk_stream(texts: &[&str]) -> RecordStream<Chunk> {
        let records: Vec<DataRecord<Chunk>> = texts
            .iter()
            .enumerate()
            .map(|(i, text)| {
                DataRecord::new(
                    format!("doc__{i}"),
                    Chunk {
                        text: text.to_string(),
                        summary_hint: text.to_string(),
                    },
                )
            })
            .collect();
        Box::pin(try_stream! {
            for record in records {
                yield record;
            }
        })
    }

    #[tokio::test]
    async fn stages_every_record_before_uploading() {
        let staging = tempfile::tempdir().unwrap();
        let server = httpmock::MockServer::start();
        let import = server.mock(|when, then| {
            when.method(httpmock::Method::POST);
            then.status(200).json_body(serde_json::json!({}));
        });

        let transport = FakeTransport::default();
        let sink = DiscoveryEngineSink::new("gs://bucket/chunks.jsonl", "stores/docs", transport.clone())
            .with_host(server.base_url())
            .with_staging_dir(staging.path());

        sink.write(chunk_stream(&["alpha", "beta"])).await.unwrap();

        import.assert();
        let staged = transport.staged_contents.lock().unwrap();
        assert_eq!(staged.len(), 1);
        let lines: Vec<&str> = staged[0].lines().collect();
        assert_eq!(lines.len(), 2);
        let first: IndexRecord = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.decode_text().unwrap(), "alpha");

        let uploads = transport.uploads.lock().unwrap();
        assert_eq!(uploads[0].1, "gs://bucket/chunks.jsonl");
    }

    #[tokio::test]
    async fn removes_the_staged_file_after_success() {
        let staging = tempfile::tempdir().unwrap();
        let server = httpmock::MockServer::start();
        server.mock(|when, then| {
            when.method(httpmock::Method::POST);
            then.status(200).json_body(serde_json::json!({}));
        });

        let sink = DiscoveryEngineSink::new("gs://b/c.jsonl", "stores/docs", FakeTransport::default())
            .with_host(server.base_url())
            .with_staging_dir(staging.path());
        sink.write(chunk_stream(&["only"])).await.unwrap();

        assert_eq!(std::fs::read_dir(staging.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn keeps_the_staged_file_when_the_import_is_rejected() {
        let staging = tempfile::tempdir().unwrap();
        let server = httpmock::MockServer::start();
        server.mock(|when, then| {
            when.method(httpmock::Method::POST);
            then.status(403).body("permission denied");
        });

        let sink = DiscoveryEngineSink::new("gs://b/c.jsonl", "stores/docs", FakeTransport::default())
            .with_host(server.base_url())
            .with_staging_dir(staging.path());

        let result = sink.write(chunk_stream(&["kept"])).await;
        assert!(matches!(
            result,
            Err(DataflowError::Import { status: 403, .. })
        ));
        assert_eq!(std::fs::read_dir(staging.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn upload_failure_skips_the_import_trigger() {
        let staging = tempfile::tempdir().unwrap();
        let server = httpmock::MockServer::start();
        let import = server.mock(|when, then| {
            when.method(httpmock::Method::POST);
            then.status(200);
        });

        let transport = FakeTransport {
            fail_upload: true,
            ..Default::default()
        };
        let sink = DiscoveryEngineSink::new("gs://b/c.jsonl", "stores/docs", transport)
            .with_host(server.base_url())
            .with_staging_dir(staging.path());

        let result = sink.write(chunk_stream(&["x"])).await;
        assert!(matches!(result, Err(DataflowError::Transport(_))));
        assert_eq!(import.hits(), 0);
    }

    #[tokio::test]
    async fn import_request_carries_auth_and_reconciliation_mode() {
        let staging = tempfile::tempdir().unwrap();
        let server = httpmock::MockServer::start();
        let import = server.mock(|when, then| {
            when.method(httpmock::Method::POST)
                .path("/v1/projects/p/dataStores/d/branches/0/documents:import")
                .header("authorization", "Bearer fake-token")
                .json_body(serde_json::json!({
                    "gcsSource": { "inputUris": ["gs://bucket/chunks.jsonl"] },
                    "reconciliationMode": "INCREMENTAL",
                }));
            then.status(200).json_body(serde_json::json!({}));
        });

        let sink = DiscoveryEngineSink::new(
            "gs://bucket/chunks.jsonl",
            "projects/p/dataStores/d/branches/0/documents",
            FakeTransport::default(),
        )
        .with_host(server.base_url())
        .with_staging_dir(staging.path());

        sink.write(chunk_stream(&["body"])).await.unwrap();
        import.assert();
    }
}
