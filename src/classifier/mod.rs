pub mod heuristic;
pub mod remote;
pub mod text_recognition;

use async_trait::async_trait;
use image::RgbImage;
use tracing::info;

use crate::common::AnalysisResult;
use crate::config::{ClassifierStrategy, Configuration};
use crate::error::{ClassifierError, ConfigError};

pub use heuristic::{HeuristicThresholds, LocalHeuristicClassifier};
pub use remote::{CommandTransport, RemoteClassifier, VisionRequest, VisionTransport};
pub use text_recognition::{NoTextRecognizer, TesseractCli, TextRecognizer};

/// Turns one decoded photograph into one [`AnalysisResult`].
///
/// An `Err` is a failure of the backend itself (network, quota, malformed
/// answer) and is scoped to the single image by the batch pipeline.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn analyze(&self, image: &RgbImage) -> Result<AnalysisResult, ClassifierError>;
    fn name(&self) -> &'static str;
}

/// Selects the backend named by `configuration`.
///
/// `recognizer` overrides the configured OCR command for the local strategy;
/// `transport` overrides the configured remote command.
pub fn build_classifier(
    configuration: &Configuration,
    recognizer: Option<Box<dyn TextRecognizer>>,
    transport: Option<Box<dyn VisionTransport>>,
) -> Result<Box<dyn Classifier>, ConfigError> {
    let classifier: Box<dyn Classifier> = match configuration.strategy {
        ClassifierStrategy::Local => {
            let recognizer: Box<dyn TextRecognizer> =
                match (recognizer, &configuration.ocr_command) {
                    (Some(recognizer), _) => recognizer,
                    (None, Some(command)) => Box::new(TesseractCli::new(command.clone())),
                    (None, None) => Box::new(NoTextRecognizer),
                };
            info!("Using local heuristic classifier with {}", recognizer.name());
            Box::new(
                LocalHeuristicClassifier::new(configuration.thresholds.clone())
                    .with_recognizer(recognizer),
            )
        }
        ClassifierStrategy::Remote => {
            let api_key = configuration.api_key()?;
            let transport: Box<dyn VisionTransport> = match (transport, &configuration.remote_command) {
                (Some(transport), _) => transport,
                (None, Some(command)) => Box::new(CommandTransport::new(command.clone(), api_key)),
                (None, None) => return Err(ConfigError::MissingTransport),
            };
            info!(
                "Using remote classifier {} via {}",
                configuration.remote_model,
                transport.name()
            );
            Box::new(RemoteClassifier::new(
                transport,
                configuration.remote_model.clone(),
                configuration.remote_endpoint.clone(),
                configuration.remote_timeout(),
            ))
        }
    };

    Ok(classifier)
}
