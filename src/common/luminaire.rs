use std::fmt;

use chrono::{DateTime, Utc};

/// Lighting technology of a fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LuminaireType {
    Led,
    /// High-intensity discharge: sodium, metal-halide or mercury vapour.
    Hid,
    Unknown,
}

impl LuminaireType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LuminaireType::Led => "LED",
            LuminaireType::Hid => "HID",
            LuminaireType::Unknown => "UNKNOWN",
        }
    }

    /// Label used in exported reports, where HID is shown as conventional lighting.
    pub fn report_label(&self) -> &'static str {
        match self {
            LuminaireType::Hid => "CONVENCIONAL",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for LuminaireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of classifying a single photograph.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    luminaire_type: LuminaireType,
    confidence: f64,
    explanation: String,
    visual_cues: Vec<String>,
    file_name: Option<String>,
    timestamp: Option<DateTime<Utc>>,
}

impl AnalysisResult {
    /// Confidence is clamped to `[0, 1]`; NaN collapses to zero.
    pub fn new(luminaire_type: LuminaireType, confidence: f64, explanation: impl Into<String>) -> Self {
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };

        Self {
            luminaire_type,
            confidence,
            explanation: explanation.into(),
            visual_cues: Vec::new(),
            file_name: None,
            timestamp: None,
        }
    }

    /// Well-formed result for an analysis that failed internally.
    pub fn failed(reason: impl fmt::Display) -> Self {
        Self::new(
            LuminaireType::Unknown,
            0.0,
            format!("Erro no processamento: {}", reason),
        )
    }

    pub fn with_cues(mut self, visual_cues: Vec<String>) -> Self {
        self.visual_cues = visual_cues;
        self
    }

    pub fn for_file(mut self, file_name: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        self.file_name = Some(file_name.into());
        self.timestamp = Some(timestamp);
        self
    }

    pub fn luminaire_type(&self) -> LuminaireType {
        self.luminaire_type
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    pub fn visual_cues(&self) -> &[String] {
        &self.visual_cues
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_is_clamped() {
        assert_eq!(AnalysisResult::new(LuminaireType::Led, 1.7, "").confidence(), 1.0);
        assert_eq!(AnalysisResult::new(LuminaireType::Hid, -0.2, "").confidence(), 0.0);
        assert_eq!(AnalysisResult::new(LuminaireType::Hid, f64::NAN, "").confidence(), 0.0);
    }

    #[test]
    fn failed_result_is_unknown_with_zero_confidence() {
        let result = AnalysisResult::failed("canvas unavailable");
        assert_eq!(result.luminaire_type(), LuminaireType::Unknown);
        assert_eq!(result.confidence(), 0.0);
        assert!(result.explanation().contains("canvas unavailable"));
        assert!(result.visual_cues().is_empty());
    }

    #[test]
    fn hid_is_reported_as_conventional() {
        assert_eq!(LuminaireType::Hid.report_label(), "CONVENCIONAL");
        assert_eq!(LuminaireType::Led.report_label(), "LED");
        assert_eq!(LuminaireType::Unknown.to_string(), "UNKNOWN");
    }
}
