//! Ingest run configuration.
//!
//! Everything a run needs (root paths, extension set, chunking parameters,
//! destination) is explicit here, with documented defaults and a
//! fail-fast [`IngestConfig::validate`] that runs before any stage does.

use std::path::PathBuf;

use crate::sources::DEFAULT_EXTENSIONS;
use crate::transforms::ChunkingConfig;
use crate::types::DataflowError;

/// Where the chunk stream ends up.
#[derive(Clone, Debug)]
pub enum Destination {
    /// Newline-delimited JSON on the local filesystem (dry runs, inspection).
    LocalFile { path: PathBuf },
    /// Remote document store: upload to `bucket_uri`, then trigger an import
    /// against the `data_store` resource on `host`.
    DiscoveryEngine {
        bucket_uri: String,
        data_store: String,
        host: String,
    },
}

/// Full configuration for one ingest run.
#[derive(Clone, Debug)]
pub struct IngestConfig {
    /// Root paths to enumerate (directories or single files).
    pub roots: Vec<PathBuf>,
    /// Allowed file extensions, each including the dot.
    pub extensions: Vec<String>,
    /// Chunk windowing parameters.
    pub chunking: ChunkingConfig,
    pub destination: Destination,
}

impl IngestConfig {
    /// Configuration for a local (dry-run) ingest with default extensions
    /// and chunking.
    pub fn local(roots: Vec<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            roots,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            chunking: ChunkingConfig::default(),
            destination: Destination::LocalFile {
                path: output.into(),
            },
        }
    }

    /// Reject configurations that cannot produce a meaningful run, before
    /// any stage executes.
    pub fn validate(&self) -> Result<(), DataflowError> {
        if self.roots.is_empty() {
            return Err(DataflowError::Config(
                "at least one root path is required".into(),
            ));
        }
        if self.extensions.is_empty() {
            return Err(DataflowError::Config(
                "at least one allowed extension is required".into(),
            ));
        }
        self.chunking.validate()?;
        match &self.destination {
            Destination::LocalFile { path } => {
                if path.as_os_str().is_empty() {
                    return Err(DataflowError::Config("output path must not be empty".into()));
                }
            }
            Destination::DiscoveryEngine {
                bucket_uri,
                data_store,
                host,
            } => {
                if bucket_uri.is_empty() {
                    return Err(DataflowError::Config("bucket URI must not be empty".into()));
                }
                if data_store.is_empty() {
                    return Err(DataflowError::Config(
                        "data store resource must not be empty".into(),
                    ));
                }
                if host.is_empty() {
                    return Err(DataflowError::Config("API host must not be empty".into()));
                }
            }
        }
        Ok(())
    }
}
