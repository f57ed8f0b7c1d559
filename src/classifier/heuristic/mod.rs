//! Local heuristic analyzer: keyword evidence plus colorimetric evidence,
//! fused into one integer score.
pub mod color_signal;
pub mod text_signal;
pub mod thresholds;

use async_trait::async_trait;
use image::RgbImage;
use tracing::{debug, warn};

use crate::classifier::{Classifier, NoTextRecognizer, TextRecognizer};
use crate::common::{AnalysisResult, LuminaireType};
use crate::error::ClassifierError;

pub use color_signal::{ColorHistogram, ColorSignal};
pub use text_signal::TextSignal;
pub use thresholds::HeuristicThresholds;

const LED_EXPLANATION: &str = "Identificado visualmente como LED (Chips de fósforo amarelos visíveis ou marcações 'LED/Driver' na carcaça).";
const HID_EXPLANATION: &str = "Identificado como CONVENCIONAL (HID) pela presença de bulbo de vidro, soquete E40/E27 ou códigos (SON/NAV).";
const INCONCLUSIVE_EXPLANATION: &str =
    "Inconclusivo. Sem chips de LED visíveis ou códigos legíveis na imagem desligada.";

pub struct LocalHeuristicClassifier {
    thresholds: HeuristicThresholds,
    recognizer: Box<dyn TextRecognizer>,
}

impl LocalHeuristicClassifier {
    pub fn new(thresholds: HeuristicThresholds) -> Self {
        Self {
            thresholds,
            recognizer: Box::new(NoTextRecognizer),
        }
    }

    pub fn with_recognizer(mut self, recognizer: Box<dyn TextRecognizer>) -> Self {
        self.recognizer = recognizer;
        self
    }

    /// Deterministic classification of a pixel buffer and the text read from it.
    /// Internal failures become an `Unknown` result with zero confidence.
    pub fn classify(&self, image: &RgbImage, recognized_text: Option<&str>) -> AnalysisResult {
        match self.try_classify(image, recognized_text) {
            Ok(result) => result,
            Err(e) => {
                warn!("Local analysis failed: {}", e);
                AnalysisResult::failed(e)
            }
        }
    }

    fn try_classify(
        &self,
        image: &RgbImage,
        recognized_text: Option<&str>,
    ) -> Result<AnalysisResult, ClassifierError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(ClassifierError::EmptyImage);
        }

        let text = text_signal::text_signal(recognized_text.unwrap_or_default(), &self.thresholds);
        let histogram = color_signal::sample_histogram(image, &self.thresholds);
        let color = color_signal::color_signal(&histogram, &self.thresholds);

        debug!(
            "Heuristic signals: text={} color={} phosphor={:.4} bulb={:.4}",
            text.score,
            color.score,
            histogram.phosphor_ratio(),
            histogram.bulb_ratio()
        );

        let mut cues = text.cues;
        cues.extend(color.cue);

        Ok(fuse(text.score + color.score, cues, &self.thresholds))
    }
}

/// Maps a fused score to a typed result. Positive means LED, negative HID.
pub fn fuse(score: i32, cues: Vec<String>, thresholds: &HeuristicThresholds) -> AnalysisResult {
    let scaled = |score: i32| {
        (thresholds.base_confidence + thresholds.confidence_step * score.abs() as f64)
            .min(thresholds.max_confidence)
    };

    let result = if score > 0 {
        AnalysisResult::new(LuminaireType::Led, scaled(score), LED_EXPLANATION)
    } else if score < 0 {
        AnalysisResult::new(LuminaireType::Hid, scaled(score), HID_EXPLANATION)
    } else {
        AnalysisResult::new(
            LuminaireType::Unknown,
            thresholds.inconclusive_confidence,
            INCONCLUSIVE_EXPLANATION,
        )
    };

    result.with_cues(cues)
}

#[async_trait]
impl Classifier for LocalHeuristicClassifier {
    /// Recognition failures are logged and treated as "no text".
    async fn analyze(&self, image: &RgbImage) -> Result<AnalysisResult, ClassifierError> {
        let text = match self.recognizer.recognize(image).await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("{} failed, ignoring text signal: {}", self.recognizer.name(), e);
                None
            }
        };

        Ok(self.classify(image, text.as_deref()))
    }

    fn name(&self) -> &'static str {
        "LocalHeuristicClassifier"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecognitionError;
    use image::{ImageBuffer, Rgb};

    struct FailingRecognizer;

    #[async_trait]
    impl TextRecognizer for FailingRecognizer {
        async fn recognize(&self, _image: &RgbImage) -> Result<String, RecognitionError> {
            Err(RecognitionError::Exit(Some(1)))
        }

        fn name(&self) -> &'static str {
            "FailingRecognizer"
        }
    }

    struct FixedRecognizer(&'static str);

    #[async_trait]
    impl TextRecognizer for FixedRecognizer {
        async fn recognize(&self, _image: &RgbImage) -> Result<String, RecognitionError> {
            Ok(self.0.to_string())
        }

        fn name(&self) -> &'static str {
            "FixedRecognizer"
        }
    }

    fn classifier() -> LocalHeuristicClassifier {
        LocalHeuristicClassifier::new(HeuristicThresholds::default())
    }

    fn solid(color: [u8; 3]) -> RgbImage {
        ImageBuffer::from_pixel(50, 50, Rgb(color))
    }

    #[test]
    fn fusion_confidence_grows_with_score_and_caps() {
        let thresholds = HeuristicThresholds::default();

        let led = fuse(1, vec![], &thresholds);
        assert_eq!(led.luminaire_type(), LuminaireType::Led);
        assert!((led.confidence() - 0.7).abs() < 1e-9);

        let hid = fuse(-2, vec![], &thresholds);
        assert_eq!(hid.luminaire_type(), LuminaireType::Hid);
        assert!((hid.confidence() - 0.8).abs() < 1e-9);

        assert_eq!(fuse(7, vec![], &thresholds).confidence(), 0.95);
        assert_eq!(fuse(-12, vec![], &thresholds).confidence(), 0.95);
    }

    #[test]
    fn zero_score_is_inconclusive() {
        let result = fuse(0, vec![], &HeuristicThresholds::default());
        assert_eq!(result.luminaire_type(), LuminaireType::Unknown);
        assert_eq!(result.confidence(), 0.3);
        assert_eq!(result.explanation(), INCONCLUSIVE_EXPLANATION);
    }

    #[test]
    fn phosphor_image_is_led() {
        let result = classifier().classify(&solid([230, 210, 40]), None);
        assert_eq!(result.luminaire_type(), LuminaireType::Led);
        assert!((result.confidence() - 0.9).abs() < 1e-9);
        assert_eq!(result.visual_cues().len(), 1);
    }

    #[test]
    fn text_and_color_are_summed() {
        // bulb (-2) + sodium code (-5)
        let result = classifier().classify(&solid([250, 250, 250]), Some("SON-T 250W"));
        assert_eq!(result.luminaire_type(), LuminaireType::Hid);
        assert_eq!(result.confidence(), 0.95);
        assert_eq!(result.visual_cues().len(), 2);
        assert!(result.visual_cues()[0].contains("Sódio"));
    }

    #[test]
    fn empty_image_yields_failed_result() {
        let result = classifier().classify(&RgbImage::new(0, 0), Some("LED"));
        assert_eq!(result.luminaire_type(), LuminaireType::Unknown);
        assert_eq!(result.confidence(), 0.0);
        assert!(result.explanation().starts_with("Erro no processamento"));
    }

    #[test]
    fn classification_is_deterministic() {
        let image = ImageBuffer::from_fn(64, 48, |x, y| {
            Rgb([(x * 4) as u8, (y * 5) as u8, ((x + y) * 2) as u8])
        });
        let classifier = classifier();

        let first = classifier.classify(&image, Some("driver E27"));
        let second = classifier.classify(&image, Some("driver E27"));
        assert_eq!(first, second);
        assert_eq!(first.confidence().to_bits(), second.confidence().to_bits());
    }

    #[tokio::test]
    async fn recognition_failure_is_zero_signal() {
        let classifier = classifier().with_recognizer(Box::new(FailingRecognizer));
        let result = classifier.analyze(&solid([60, 60, 70])).await.unwrap();
        assert_eq!(result.luminaire_type(), LuminaireType::Unknown);
        assert_eq!(result.confidence(), 0.3);
    }

    #[tokio::test]
    async fn recognized_text_feeds_the_score() {
        let classifier = classifier().with_recognizer(Box::new(FixedRecognizer("LED MODULE")));
        let result = classifier.analyze(&solid([60, 60, 70])).await.unwrap();
        assert_eq!(result.luminaire_type(), LuminaireType::Led);
        assert!((result.confidence() - 0.95).abs() < 1e-9);
    }
}
