//! External transfer and credential collaborators.
//!
//! The remote sink needs exactly two capabilities from the outside world:
//! copying a local file to a bucket location, and producing a short-lived
//! access token for the import trigger. Both sit behind [`Transport`] so the
//! pipeline stays testable without network access or installed cloud
//! tooling: tests inject a fake, production uses [`GcloudTransport`].

use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;

use crate::types::DataflowError;

/// Narrow capability interface over the external transfer/auth tooling.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Copy a local file to the given destination URI.
    async fn upload(&self, local: &Path, destination: &str) -> Result<(), DataflowError>;

    /// Produce a bearer token for authenticated calls to the document store.
    async fn access_token(&self) -> Result<String, DataflowError>;
}

/// Production transport shelling out to the Google Cloud CLI tools:
/// `gsutil cp` for uploads and `gcloud auth print-access-token` for tokens.
#[derive(Clone, Copy, Debug, Default)]
pub struct GcloudTransport;

impl GcloudTransport {
    pub fn new() -> Self {
        Self
    }
}

async fn run_command(mut command: Command, what: &str) -> Result<Vec<u8>, DataflowError> {
    let output = command.output().await.map_err(|err| {
        DataflowError::Transport(format!("failed to spawn {what}: {err}"))
    })?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(DataflowError::Transport(format!(
            "{what} exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }
    Ok(output.stdout)
}

#[async_trait]
impl Transport for GcloudTransport {
    async fn upload(&self, local: &Path, destination: &str) -> Result<(), DataflowError> {
        let mut command = Command::new("gsutil");
        command.arg("cp").arg(local).arg(destination);
        run_command(command, "gsutil cp").await?;
        Ok(())
    }

    async fn access_token(&self) -> Result<String, DataflowError> {
        let mut command = Command::new("gcloud");
        command.args(["auth", "print-access-token"]);
        let stdout = run_command(command, "gcloud auth print-access-token").await?;
        let token = String::from_utf8_lossy(&stdout).trim().to_string();
        if token.is_empty() {
            return Err(DataflowError::Transport(
                "gcloud returned an empty access token".into(),
            ));
        }
        Ok(token)
    }
}
