//! Documentation ingest runner.
//!
//! Enumerates the configured documentation roots, chunks their contents,
//! and ships the result either to a local JSONL file (`--dry-run`) or to the
//! remote document store. Configuration comes from the environment (a `.env`
//! file is honored):
//!
//! * `DOCFLOW_ROOTS` — comma-separated root paths (required)
//! * `DOCFLOW_EXTENSIONS` — comma-separated extension list (default `.md,.mdx,.txt`)
//! * `DOCFLOW_TARGET_WORDS` / `DOCFLOW_OVERLAP_RATIO` — chunking parameters
//! * `DOCFLOW_OUT` — local output path for dry runs (default `chunks/chunks_dryrun.jsonl`)
//! * `DOCFLOW_BUCKET_URI` / `DOCFLOW_DATA_STORE` — remote destination (required unless `--dry-run`)
//! * `DOCFLOW_HOST` — remote API host override
//!
//! Flags: `--dry-run` writes locally instead of uploading; `--debug` logs
//! stage transitions. Exits non-zero on any failure.

use std::env;
use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

use docflow::config::{Destination, IngestConfig};
use docflow::pipeline::PipelineBuilder;
use docflow::sinks::{DEFAULT_DISCOVERY_HOST, DiscoveryEngineSink, JsonLineSink};
use docflow::sources::{DEFAULT_EXTENSIONS, FileSource};
use docflow::transforms::{ChunkingConfig, ChunkingTransform, SentenceSplitter};
use docflow::transport::GcloudTransport;
use docflow::types::DataflowError;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

fn load_config(dry_run: bool) -> Result<IngestConfig, DataflowError> {
    let roots: Vec<PathBuf> = env::var("DOCFLOW_ROOTS")
        .map_err(|_| DataflowError::Config("DOCFLOW_ROOTS is required".into()))
        .map(|value| parse_list(&value).into_iter().map(PathBuf::from).collect())?;

    let extensions = env::var("DOCFLOW_EXTENSIONS")
        .map(|value| parse_list(&value))
        .unwrap_or_else(|_| DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect());

    let mut chunking = ChunkingConfig::default();
    if let Ok(value) = env::var("DOCFLOW_TARGET_WORDS") {
        chunking.target_words = value
            .parse()
            .map_err(|_| DataflowError::Config(format!("invalid DOCFLOW_TARGET_WORDS: {value}")))?;
    }
    if let Ok(value) = env::var("DOCFLOW_OVERLAP_RATIO") {
        chunking.overlap_ratio = value
            .parse()
            .map_err(|_| DataflowError::Config(format!("invalid DOCFLOW_OVERLAP_RATIO: {value}")))?;
    }

    let destination = if dry_run {
        let path = env::var("DOCFLOW_OUT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("chunks/chunks_dryrun.jsonl"));
        Destination::LocalFile { path }
    } else {
        Destination::DiscoveryEngine {
            bucket_uri: env::var("DOCFLOW_BUCKET_URI")
                .map_err(|_| DataflowError::Config("DOCFLOW_BUCKET_URI is required".into()))?,
            data_store: env::var("DOCFLOW_DATA_STORE")
                .map_err(|_| DataflowError::Config("DOCFLOW_DATA_STORE is required".into()))?,
            host: env::var("DOCFLOW_HOST")
                .unwrap_or_else(|_| DEFAULT_DISCOVERY_HOST.to_string()),
        }
    };

    Ok(IngestConfig {
        roots,
        extensions,
        chunking,
        destination,
    })
}

async fn run(dry_run: bool, debug: bool) -> Result<(), DataflowError> {
    let config = load_config(dry_run)?;
    config.validate()?;

    let source =
        FileSource::new(config.roots.clone()).with_extensions(config.extensions.clone());
    let builder = PipelineBuilder::from_source(source)
        .then(SentenceSplitter::new())
        .then(ChunkingTransform::new(config.chunking)?);

    match config.destination {
        Destination::LocalFile { path } => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await?;
                }
            }
            tracing::info!(path = %path.display(), "ingesting to local file");
            builder.sink(JsonLineSink::new(path)).run(debug).await
        }
        Destination::DiscoveryEngine {
            bucket_uri,
            data_store,
            host,
        } => {
            tracing::info!(bucket = %bucket_uri, "ingesting to document store");
            let sink = DiscoveryEngineSink::new(bucket_uri, data_store, GcloudTransport::new())
                .with_host(host);
            builder.sink(sink).run(debug).await
        }
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    let dry_run = args.iter().any(|arg| arg == "--dry-run");
    let debug_flag = args.iter().any(|arg| arg == "--debug");

    tracing::info!(dry_run, debug = debug_flag, "starting ingest");
    if let Err(err) = run(dry_run, debug_flag).await {
        tracing::error!(error = %err, "ingest failed");
        std::process::exit(1);
    }
    tracing::info!("ingest completed");
}
