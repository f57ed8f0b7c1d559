//! Remote AI classifier: the judgment is delegated to an image-understanding
//! service reached through a [`VisionTransport`].
mod transport;

use std::{io::Cursor, time::Duration};

use async_trait::async_trait;
use image::{ImageFormat, RgbImage};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::classifier::Classifier;
use crate::common::{AnalysisResult, LuminaireType};
use crate::error::ClassifierError;

pub use transport::CommandTransport;

pub const CLASSIFICATION_PROMPT: &str = "\
You are inspecting a photograph of a street-lighting fixture that is switched off. \
Classify the light source as LED or HID (sodium, metal-halide or mercury vapour). \
Judge only from the emitter and housing: several small diode points, each with its own \
lens, mean LED; a single large glass bulb in front of a curved reflector means HID. \
Ignore the pole, the sky and the surroundings. Answer with JSON only, using the fields \
classification (LED, HID or UNKNOWN), confidence (0 to 1), explanation and visualCues \
(a list of short evidence strings).";

/// One classification call, independent of the wire protocol.
#[derive(Debug, Clone, Serialize)]
pub struct VisionRequest {
    pub model: String,
    pub endpoint: String,
    pub prompt: String,
    pub mime_type: String,
    pub response_schema: Value,
    #[serde(skip)]
    pub image: Vec<u8>,
}

/// Carries a [`VisionRequest`] to the service and returns the raw response text.
#[async_trait]
pub trait VisionTransport: Send + Sync {
    async fn send(&self, request: &VisionRequest) -> Result<String, ClassifierError>;
    fn name(&self) -> &'static str;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteVerdict {
    classification: String,
    confidence: f64,
    #[serde(default)]
    explanation: String,
    #[serde(default)]
    visual_cues: Vec<String>,
}

pub struct RemoteClassifier {
    transport: Box<dyn VisionTransport>,
    model: String,
    endpoint: String,
    timeout: Duration,
}

impl RemoteClassifier {
    pub fn new(
        transport: Box<dyn VisionTransport>,
        model: impl Into<String>,
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            transport,
            model: model.into(),
            endpoint: endpoint.into(),
            timeout,
        }
    }

    pub fn build_request(&self, image: &RgbImage) -> Result<VisionRequest, ClassifierError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(ClassifierError::EmptyImage);
        }

        let mut jpeg = Vec::new();
        image.write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)?;

        Ok(VisionRequest {
            model: self.model.clone(),
            endpoint: self.endpoint.clone(),
            prompt: CLASSIFICATION_PROMPT.to_string(),
            mime_type: "image/jpeg".to_string(),
            response_schema: response_schema(),
            image: jpeg,
        })
    }
}

fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "classification": { "type": "STRING", "enum": ["LED", "HID", "UNKNOWN"] },
            "confidence": { "type": "NUMBER" },
            "explanation": { "type": "STRING" },
            "visualCues": { "type": "ARRAY", "items": { "type": "STRING" } }
        },
        "required": ["classification", "confidence", "explanation", "visualCues"]
    })
}

/// Parses the service answer. Markdown code fences around the JSON are tolerated.
pub fn parse_verdict(text: &str) -> Result<AnalysisResult, ClassifierError> {
    let body = strip_code_fence(text);
    let verdict: RemoteVerdict = serde_json::from_str(body)
        .map_err(|e| ClassifierError::MalformedResponse(e.to_string()))?;

    let luminaire_type = match verdict.classification.trim().to_uppercase().as_str() {
        "LED" => LuminaireType::Led,
        "HID" => LuminaireType::Hid,
        _ => LuminaireType::Unknown,
    };

    Ok(AnalysisResult::new(luminaire_type, verdict.confidence, verdict.explanation)
        .with_cues(verdict.visual_cues))
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    match trimmed.strip_prefix("```") {
        Some(rest) => {
            let rest = rest.trim_start_matches("json");
            rest.strip_suffix("```").unwrap_or(rest).trim()
        }
        None => trimmed,
    }
}

#[async_trait]
impl Classifier for RemoteClassifier {
    async fn analyze(&self, image: &RgbImage) -> Result<AnalysisResult, ClassifierError> {
        let request = self.build_request(image)?;
        debug!(
            "Sending {} byte image to {} via {}",
            request.image.len(),
            self.model,
            self.transport.name()
        );

        let response = tokio::time::timeout(self.timeout, self.transport.send(&request))
            .await
            .map_err(|_| ClassifierError::Timeout(self.timeout))??;

        parse_verdict(&response)
    }

    fn name(&self) -> &'static str {
        "RemoteClassifier"
    }
}
