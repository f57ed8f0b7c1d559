use std::{path::PathBuf, time::Duration};

use thiserror::Error;

// Main Application Error Type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration Error: {0}")]
    Config(#[from] ConfigError),
    #[error("Classifier Error: {0}")]
    Classifier(#[from] ClassifierError),
    #[error("Decode Error: {0}")]
    Decode(#[from] DecodeError),
    #[error("Export Error: {0}")]
    Export(#[from] ExportError),
    #[error("Failed to scan {0}: {1}")]
    Intake(PathBuf, #[source] walkdir::Error),
    #[error("No images found in the selected folders.")]
    NoImagesFound,
    #[error("Pipeline Error: {0}")]
    Pipeline(String),
}

// Turning a raw image source into a pixel buffer
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Failed to read {0}: {1}")]
    Read(PathBuf, #[source] std::io::Error),
    #[error("Unsupported or corrupt image: {0}")]
    Image(#[from] image::ImageError),
    #[error("Image has no pixels.")]
    EmptyImage,
}

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("Failed to reach the classification service: {0}")]
    Transport(String),
    #[error("Classification service returned status {status}: {message}")]
    Service { status: i32, message: String },
    #[error("Classification service did not answer within {0:?}")]
    Timeout(Duration),
    #[error("Malformed classification response: {0}")]
    MalformedResponse(String),
    #[error("Failed to encode image for classification: {0}")]
    Encode(#[from] image::ImageError),
    #[error("Image has no pixels to sample.")]
    EmptyImage,
}

#[derive(Error, Debug)]
pub enum RecognitionError {
    #[error("Failed to start text recognition: {0}")]
    Spawn(std::io::Error),
    #[error("Text recognition I/O failed: {0}")]
    Io(std::io::Error),
    #[error("Text recognition exited with status {0:?}")]
    Exit(Option<i32>),
    #[error("Failed to encode image for text recognition: {0}")]
    Encode(#[from] image::ImageError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("The remote classifier requires an API key (set LUMICHECK_API_KEY).")]
    MissingCredentials,
    #[error("The remote classifier has no transport (set LUMICHECK_REMOTE_COMMAND).")]
    MissingTransport,
    #[error("Invalid configuration: {0}")]
    Invalid(String),
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to write report {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),
    #[error("There are no results to export.")]
    EmptyReport,
}
