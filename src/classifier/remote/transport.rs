use std::{
    path::{Path, PathBuf},
    process::Stdio,
};

use async_trait::async_trait;
use serde::Serialize;
use tokio::{io::AsyncWriteExt, process::Command};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{VisionRequest, VisionTransport};
use crate::config::ENV_PREFIX;
use crate::error::ClassifierError;

/// Hands each request to an external client program.
///
/// The program receives the request as JSON on stdin, with `image_path`
/// pointing at a temporary JPEG, and the API key in `LUMICHECK_API_KEY`.
/// It must print the service's answer on stdout and exit with status 0.
pub struct CommandTransport {
    command: PathBuf,
    api_key: String,
}

/// Temporary JPEG handed to the client program, removed when dropped so a
/// cancelled or timed-out call leaves nothing behind.
struct ScratchImage {
    path: PathBuf,
}

impl ScratchImage {
    async fn write(bytes: &[u8]) -> Result<Self, ClassifierError> {
        let path = std::env::temp_dir().join(format!("lumicheck-{}.jpg", Uuid::new_v4()));
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| ClassifierError::Transport(e.to_string()))?;
        Ok(Self { path })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchImage {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!("Failed to remove {}: {}", self.path.display(), e);
        }
    }
}

#[derive(Serialize)]
struct CommandPayload<'a> {
    #[serde(flatten)]
    request: &'a VisionRequest,
    image_path: &'a Path,
}

impl CommandTransport {
    pub fn new(command: impl Into<PathBuf>, api_key: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            api_key: api_key.into(),
        }
    }

    async fn run(&self, payload: &[u8]) -> Result<String, ClassifierError> {
        let mut child = Command::new(&self.command)
            .env(format!("{}_API_KEY", ENV_PREFIX), &self.api_key)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ClassifierError::Transport(e.to_string()))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(payload)
                .await
                .map_err(|e| ClassifierError::Transport(e.to_string()))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| ClassifierError::Transport(e.to_string()))?;

        if !output.status.success() {
            return Err(ClassifierError::Service {
                status: output.status.code().unwrap_or(-1),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl VisionTransport for CommandTransport {
    async fn send(&self, request: &VisionRequest) -> Result<String, ClassifierError> {
        let image = ScratchImage::write(&request.image).await?;

        let payload = serde_json::to_vec(&CommandPayload {
            request,
            image_path: image.path(),
        })
        .map_err(|e| ClassifierError::Transport(e.to_string()))?;

        let response = self.run(&payload).await;
        debug!("Command transport finished: ok={}", response.is_ok());
        response
    }

    fn name(&self) -> &'static str {
        "CommandTransport"
    }
}
