//! End-to-end pipeline tests over a real (temporary) documentation tree.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::tempdir;

use docflow::pipeline::PipelineBuilder;
use docflow::sinks::{DiscoveryEngineSink, IndexRecord, JsonLineSink};
use docflow::sources::FileSource;
use docflow::transforms::{ChunkingConfig, ChunkingTransform, SentenceSplitter};
use docflow::transport::Transport;
use docflow::types::DataflowError;

fn write_corpus(root: &Path) {
    fs::create_dir(root.join("guides")).unwrap();
    fs::write(
        root.join("README.md"),
        "Welcome to the project. This file explains the basics.\n\n\
         Install the tool first. Then run the setup command. Finally verify the install.",
    )
    .unwrap();
    fs::write(
        root.join("guides/usage.txt"),
        "Usage is simple! Point the tool at your docs. Ask questions afterwards.",
    )
    .unwrap();
    fs::write(root.join("guides/diagram.png"), [0u8, 1, 2]).unwrap();
}

fn read_records(path: &Path) -> Vec<IndexRecord> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn chunking(target_words: usize, overlap_ratio: f64) -> ChunkingTransform {
    ChunkingTransform::new(ChunkingConfig {
        target_words,
        overlap_ratio,
    })
    .unwrap()
}

#[tokio::test]
async fn ingests_a_documentation_tree_into_local_jsonl() {
    let docs = tempdir().unwrap();
    write_corpus(docs.path());
    let out = tempdir().unwrap();
    let out_path = out.path().join("chunks.jsonl");

    PipelineBuilder::from_source(FileSource::new(vec![docs.path().to_path_buf()]))
        .then(SentenceSplitter::new())
        .then(chunking(8, 0.0))
        .sink(JsonLineSink::new(&out_path))
        .run(true)
        .await
        .unwrap();

    let records = read_records(&out_path);
    assert!(!records.is_empty());

    // Only .md / .txt content made it through; the png never entered the run.
    let all_text: String = records
        .iter()
        .map(|r| r.decode_text().unwrap())
        .collect::<Vec<_>>()
        .join(" ");
    assert!(all_text.contains("Welcome to the project."));
    assert!(all_text.contains("Usage is simple!"));

    // Ids are unique, store-safe, and derived from the source file.
    let ids: HashSet<&str> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids.len(), records.len());
    for record in &records {
        assert!(
            record
                .id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        );
        assert!(record.struct_data.summary_hint.chars().count() <= 320);
        assert!(
            record
                .decode_text()
                .unwrap()
                .starts_with(&record.struct_data.summary_hint)
        );
    }
    assert!(records.iter().any(|r| r.struct_data.source == "README.md"));
    assert!(records.iter().any(|r| r.struct_data.source == "usage.txt"));
}

#[tokio::test]
async fn every_source_sentence_reaches_the_sink() {
    let docs = tempdir().unwrap();
    fs::write(
        docs.path().join("doc.md"),
        "Alpha beta gamma. Delta epsilon. Zeta eta theta iota. Kappa lambda. Mu nu xi.",
    )
    .unwrap();
    let out = tempdir().unwrap();
    let out_path = out.path().join("chunks.jsonl");

    PipelineBuilder::from_source(FileSource::new(vec![docs.path().to_path_buf()]))
        .then(SentenceSplitter::new())
        .then(chunking(5, 0.3))
        .sink(JsonLineSink::new(&out_path))
        .run(false)
        .await
        .unwrap();

    let all_text: String = read_records(&out_path)
        .iter()
        .map(|r| r.decode_text().unwrap())
        .collect::<Vec<_>>()
        .join(" ");
    for sentence in [
        "Alpha beta gamma.",
        "Delta epsilon.",
        "Zeta eta theta iota.",
        "Kappa lambda.",
        "Mu nu xi.",
    ] {
        assert!(all_text.contains(sentence), "missing: {sentence}");
    }
}

#[tokio::test]
async fn empty_corpus_produces_an_empty_output_file() {
    let docs = tempdir().unwrap();
    let out = tempdir().unwrap();
    let out_path = out.path().join("chunks.jsonl");

    PipelineBuilder::from_source(FileSource::new(vec![
        docs.path().to_path_buf(),
        docs.path().join("missing"),
    ]))
    .then(SentenceSplitter::new())
    .then(ChunkingTransform::default())
    .sink(JsonLineSink::new(&out_path))
    .run(false)
    .await
    .unwrap();

    assert_eq!(fs::read_to_string(&out_path).unwrap(), "");
}

#[derive(Clone, Default)]
struct RecordingTransport {
    uploaded: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn upload(&self, local: &Path, _destination: &str) -> Result<(), DataflowError> {
        self.uploaded
            .lock()
            .unwrap()
            .push(fs::read_to_string(local)?);
        Ok(())
    }

    async fn access_token(&self) -> Result<String, DataflowError> {
        Ok("integration-token".to_string())
    }
}

#[tokio::test]
async fn remote_ingest_uploads_the_same_lines_a_local_run_writes() {
    let docs = tempdir().unwrap();
    write_corpus(docs.path());

    let pipeline_input = || {
        PipelineBuilder::from_source(FileSource::new(vec![docs.path().to_path_buf()]))
            .then(SentenceSplitter::new())
            .then(chunking(8, 0.0))
    };

    // Local run.
    let out = tempdir().unwrap();
    let local_path = out.path().join("chunks.jsonl");
    pipeline_input()
        .sink(JsonLineSink::new(&local_path))
        .run(false)
        .await
        .unwrap();
    let local_lines = fs::read_to_string(&local_path).unwrap();

    // Remote run against a mock import endpoint.
    let staging = tempdir().unwrap();
    let server = httpmock::MockServer::start();
    let import = server.mock(|when, then| {
        when.method(httpmock::Method::POST)
            .path("/v1/stores/docs:import")
            .header("authorization", "Bearer integration-token");
        then.status(200).json_body(serde_json::json!({}));
    });

    let transport = RecordingTransport::default();
    let sink = DiscoveryEngineSink::new("gs://bucket/chunks.jsonl", "stores/docs", transport.clone())
        .with_host(server.base_url())
        .with_staging_dir(staging.path());
    pipeline_input().sink(sink).run(false).await.unwrap();

    import.assert();
    let uploaded = transport.uploaded.lock().unwrap();
    assert_eq!(uploaded.len(), 1);
    assert_eq!(uploaded[0], local_lines);
    // Staged file cleaned up after the successful import.
    assert_eq!(fs::read_dir(staging.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn missing_root_is_skipped_but_extensions_still_filter() {
    let docs = tempdir().unwrap();
    fs::write(docs.path().join("kept.md"), "Kept content.").unwrap();
    fs::write(docs.path().join("ignored.rs"), "fn main() {}").unwrap();
    let out = tempdir().unwrap();
    let out_path = out.path().join("chunks.jsonl");

    let missing: PathBuf = docs.path().join("nope/also-nope");
    PipelineBuilder::from_source(FileSource::new(vec![missing, docs.path().to_path_buf()]))
        .then(SentenceSplitter::new())
        .then(ChunkingTransform::default())
        .sink(JsonLineSink::new(&out_path))
        .run(false)
        .await
        .unwrap();

    let records = read_records(&out_path);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].struct_data.source, "kept.md");
}
