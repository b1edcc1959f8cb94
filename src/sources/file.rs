//! Filesystem document enumeration.

use std::path::{Path, PathBuf};

use async_stream::try_stream;
use serde_json::json;
use walkdir::WalkDir;

use crate::pipeline::{RecordStream, Source};
use crate::types::{DataRecord, META_EXTENSION, META_FILE_NAME, META_FILE_PATH, Metadata};

/// Extensions ingested when none are configured explicitly.
pub const DEFAULT_EXTENSIONS: [&str; 3] = [".md", ".mdx", ".txt"];

/// Streams documents found under a set of root paths.
///
/// Roots may be directories (walked recursively) or single files. A root that
/// does not exist contributes zero records rather than an error, since
/// ingest jobs routinely list optional locations. Extension matching is case-insensitive
/// against the configured suffix set.
///
/// Directory entries are visited in file-name order so repeated runs over an
/// unchanged tree enumerate identically.
#[derive(Clone, Debug)]
pub struct FileSource {
    roots: Vec<PathBuf>,
    extensions: Vec<String>,
}

impl FileSource {
    /// Create a source over the given roots with [`DEFAULT_EXTENSIONS`].
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }

    /// Replace the allowed extension set (each entry including the dot).
    #[must_use]
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    fn matches(&self, path: &Path) -> bool {
        let Some(name) = path.file_name() else {
            return false;
        };
        let name = name.to_string_lossy().to_lowercase();
        self.extensions
            .iter()
            .any(|ext| name.ends_with(&ext.to_lowercase()))
    }

    /// Resolve the full file list up front; contents are read lazily.
    fn enumerate(&self) -> Result<Vec<PathBuf>, std::io::Error> {
        let mut files = Vec::new();
        for root in &self.roots {
            if !root.exists() {
                tracing::debug!(root = %root.display(), "root path missing, skipping");
                continue;
            }
            if root.is_file() {
                if self.matches(root) {
                    files.push(root.clone());
                }
                continue;
            }
            for entry in WalkDir::new(root).sort_by_file_name() {
                let entry = entry.map_err(std::io::Error::from)?;
                if entry.file_type().is_file() && self.matches(entry.path()) {
                    files.push(entry.into_path());
                }
            }
        }
        Ok(files)
    }
}

fn record_metadata(path: &Path) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert(META_FILE_PATH.into(), json!(path.display().to_string()));
    metadata.insert(
        META_FILE_NAME.into(),
        json!(
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        ),
    );
    metadata.insert(
        META_EXTENSION.into(),
        json!(
            path.extension()
                .map(|e| format!(".{}", e.to_string_lossy()))
                .unwrap_or_default()
        ),
    );
    metadata
}

impl Source for FileSource {
    type Item = String;

    fn name(&self) -> &'static str {
        "FileSource"
    }

    fn read(&self) -> RecordStream<String> {
        let source = self.clone();
        Box::pin(try_stream! {
            let files = source.enumerate()?;
            tracing::debug!(files = files.len(), "enumerated source documents");
            for path in files {
                let content = tokio::fs::read_to_string(&path).await?;
                let record = DataRecord::new(path.display().to_string(), content)
                    .with_metadata(record_metadata(&path));
                yield record;
            }
        })
    }
}
