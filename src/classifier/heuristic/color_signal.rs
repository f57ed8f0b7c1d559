//! Colorimetric evidence: yellow LED phosphor versus milky-white discharge bulbs.
use image::RgbImage;

use super::thresholds::HeuristicThresholds;

/// Pixel counts from one sampling pass.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ColorHistogram {
    pub phosphor_pixels: usize,
    pub bulb_pixels: usize,
    pub sampled: usize,
}

impl ColorHistogram {
    pub fn phosphor_ratio(&self) -> f64 {
        self.ratio(self.phosphor_pixels)
    }

    pub fn bulb_ratio(&self) -> f64 {
        self.ratio(self.bulb_pixels)
    }

    fn ratio(&self, count: usize) -> f64 {
        if self.sampled == 0 {
            0.0
        } else {
            count as f64 / self.sampled as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColorSignal {
    pub score: i32,
    pub cue: Option<String>,
}

/// Hue in degrees `[0, 360)`, saturation and value in percent.
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let r = r as f32 / 255.0;
    let g = g as f32 / 255.0;
    let b = b as f32 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let saturation = if max == 0.0 { 0.0 } else { delta / max };

    let hue = if delta == 0.0 {
        0.0 // achromatic
    } else if max == r {
        (g - b) / delta + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / delta + 2.0
    } else {
        (r - g) / delta + 4.0
    };

    (hue * 60.0, saturation * 100.0, max * 100.0)
}

/// Counts phosphor-band and bulb-band pixels over every `sample_stride`th pixel.
pub fn sample_histogram(image: &RgbImage, thresholds: &HeuristicThresholds) -> ColorHistogram {
    let mut histogram = ColorHistogram::default();

    for pixel in image.pixels().step_by(thresholds.sample_stride.max(1)) {
        let [r, g, b] = pixel.0;
        let (hue, saturation, value) = rgb_to_hsv(r, g, b);

        if hue > thresholds.phosphor_hue_min
            && hue < thresholds.phosphor_hue_max
            && saturation > thresholds.phosphor_saturation_min
            && value > thresholds.phosphor_value_min
        {
            histogram.phosphor_pixels += 1;
        }

        if saturation < thresholds.bulb_saturation_max && value > thresholds.bulb_value_min {
            histogram.bulb_pixels += 1;
        }

        histogram.sampled += 1;
    }

    histogram
}

/// Phosphor evidence wins over bulb evidence; at most one contributes.
pub fn color_signal(histogram: &ColorHistogram, thresholds: &HeuristicThresholds) -> ColorSignal {
    let phosphor_ratio = histogram.phosphor_ratio();
    let bulb_ratio = histogram.bulb_ratio();

    if phosphor_ratio > thresholds.phosphor_ratio_min {
        ColorSignal {
            score: thresholds.phosphor_weight,
            cue: Some(format!(
                "Chips de LED detectados (Fósforo Amarelo: {:.2}%)",
                phosphor_ratio * 100.0
            )),
        }
    } else if bulb_ratio > thresholds.bulb_ratio_min {
        ColorSignal {
            score: -thresholds.bulb_weight,
            cue: Some(format!(
                "Provável bulbo/vidro de lâmpada detectado (Área Clara: {:.2}%)",
                bulb_ratio * 100.0
            )),
        }
    } else {
        ColorSignal { score: 0, cue: None }
    }
}
