use serde::Deserialize;

use crate::error::ConfigError;

/// Tunable constants of the local heuristic analyzer.
///
/// The defaults are one working configuration, not a calibrated optimum.
/// Hue is in degrees, saturation and value in percent.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HeuristicThresholds {
    /// Only every Nth pixel is sampled.
    pub sample_stride: usize,
    pub phosphor_hue_min: f32,
    pub phosphor_hue_max: f32,
    pub phosphor_saturation_min: f32,
    pub phosphor_value_min: f32,
    pub bulb_saturation_max: f32,
    pub bulb_value_min: f32,
    pub phosphor_ratio_min: f64,
    pub bulb_ratio_min: f64,
    pub phosphor_weight: i32,
    pub bulb_weight: i32,
    pub led_keyword_weight: i32,
    pub sodium_keyword_weight: i32,
    pub halide_keyword_weight: i32,
    pub screw_base_weight: i32,
    pub base_confidence: f64,
    pub confidence_step: f64,
    pub max_confidence: f64,
    pub inconclusive_confidence: f64,
}

impl Default for HeuristicThresholds {
    fn default() -> Self {
        Self {
            sample_stride: 5,
            phosphor_hue_min: 45.0,
            phosphor_hue_max: 65.0,
            phosphor_saturation_min: 40.0,
            phosphor_value_min: 30.0,
            bulb_saturation_max: 15.0,
            bulb_value_min: 70.0,
            phosphor_ratio_min: 0.005, // 0.5% of sampled pixels
            bulb_ratio_min: 0.10,
            phosphor_weight: 3,
            bulb_weight: 2,
            led_keyword_weight: 4,
            sodium_keyword_weight: 5,
            halide_keyword_weight: 5,
            screw_base_weight: 2,
            base_confidence: 0.6,
            confidence_step: 0.1,
            max_confidence: 0.95,
            inconclusive_confidence: 0.3,
        }
    }
}

impl HeuristicThresholds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_stride == 0 {
            return Err(ConfigError::Invalid(
                "Sample stride must be greater than 0".to_string(),
            ));
        }

        if self.phosphor_hue_min >= self.phosphor_hue_max {
            return Err(ConfigError::Invalid(
                "Phosphor hue band is empty".to_string(),
            ));
        }

        for (name, ratio) in [
            ("Phosphor ratio", self.phosphor_ratio_min),
            ("Bulb ratio", self.bulb_ratio_min),
            ("Max confidence", self.max_confidence),
            ("Inconclusive confidence", self.inconclusive_confidence),
        ] {
            if !(0.0..=1.0).contains(&ratio) {
                return Err(ConfigError::Invalid(format!(
                    "{} must be between 0.0 and 1.0",
                    name
                )));
            }
        }

        Ok(())
    }
}
