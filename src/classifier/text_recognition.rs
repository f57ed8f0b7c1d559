use std::{io::Cursor, path::PathBuf, process::Stdio};

use async_trait::async_trait;
use image::{ImageFormat, RgbImage};
use tokio::{io::AsyncWriteExt, process::Command};
use tracing::debug;

use crate::error::RecognitionError;

/// Reads printed text (lamp codes, driver labels) off a photograph.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    async fn recognize(&self, image: &RgbImage) -> Result<String, RecognitionError>;
    fn name(&self) -> &'static str;
}

/// Recognizer used when no OCR engine is configured.
pub struct NoTextRecognizer;

#[async_trait]
impl TextRecognizer for NoTextRecognizer {
    async fn recognize(&self, _image: &RgbImage) -> Result<String, RecognitionError> {
        Ok(String::new())
    }

    fn name(&self) -> &'static str {
        "NoTextRecognizer"
    }
}

/// Runs a `tesseract`-compatible binary as `<command> stdin stdout`,
/// feeding the image as PNG.
pub struct TesseractCli {
    command: PathBuf,
}

impl TesseractCli {
    pub fn new(command: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

#[async_trait]
impl TextRecognizer for TesseractCli {
    async fn recognize(&self, image: &RgbImage) -> Result<String, RecognitionError> {
        let mut png = Vec::new();
        image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

        let mut child = Command::new(&self.command)
            .arg("stdin")
            .arg("stdout")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(RecognitionError::Spawn)?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(&png).await.map_err(RecognitionError::Io)?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(RecognitionError::Io)?;

        if !output.status.success() {
            return Err(RecognitionError::Exit(output.status.code()));
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!("Recognized {} characters of text", text.len());
        Ok(text)
    }

    fn name(&self) -> &'static str {
        "TesseractCli"
    }
}
