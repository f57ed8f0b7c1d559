//! Keyword evidence read from labels and markings on the fixture housing.
use super::thresholds::HeuristicThresholds;

/// A keyword is a run of consecutive tokens, so `L.E.D` is `["L", "E", "D"]`.
type Keyword = &'static [&'static str];

struct KeywordFamily {
    keywords: &'static [Keyword],
    cue: &'static str,
}

const LED_FAMILY: KeywordFamily = KeywordFamily {
    keywords: &[
        &["LED"],
        &["L", "E", "D"],
        &["DIODE"],
        &["MODUL"],
        &["MODULE"],
        &["DRIVER"],
        &["IP65"],
        &["IP66"],
        &["IP67"],
    ],
    cue: "Texto Técnico LED identificado (LED/DRIVER/MODULE)",
};

const SODIUM_FAMILY: KeywordFamily = KeywordFamily {
    keywords: &[
        &["SON"],
        &["NAV"],
        &["HPS"],
        &["H", "P", "S"],
        &["SODIUM"],
        &["VIALOX"],
    ],
    cue: "Código de Lâmpada de Sódio detectado (SON/NAV/HPS)",
};

const HALIDE_FAMILY: KeywordFamily = KeywordFamily {
    keywords: &[
        &["MH"],
        &["HPI"],
        &["HQI"],
        &["METAL"],
        &["HALIDE"],
        &["MERCURY"],
        &["VAPOR"],
        &["HPL"],
    ],
    cue: "Código de Lâmpada Metálica/Mercúrio detectado",
};

// Matched as substrings: socket codes are often printed glued to other text.
const SCREW_BASES: &[&str] = &["E27", "E40"];
const SCREW_BASE_CUE: &str = "Base E27/E40 detectada (Típico de lâmpadas convencionais)";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextSignal {
    pub score: i32,
    pub cues: Vec<String>,
}

impl TextSignal {
    fn add(&mut self, weight: i32, cue: &str) {
        self.score += weight;
        self.cues.push(cue.to_string());
    }
}

/// Scores recognized text. Each family contributes at most once.
pub fn text_signal(text: &str, thresholds: &HeuristicThresholds) -> TextSignal {
    let normalized = text.to_uppercase();
    let tokens: Vec<&str> = normalized
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .collect();

    let mut signal = TextSignal::default();

    if family_matches(&tokens, &LED_FAMILY) {
        signal.add(thresholds.led_keyword_weight, LED_FAMILY.cue);
    }
    if family_matches(&tokens, &SODIUM_FAMILY) {
        signal.add(-thresholds.sodium_keyword_weight, SODIUM_FAMILY.cue);
    }
    if family_matches(&tokens, &HALIDE_FAMILY) {
        signal.add(-thresholds.halide_keyword_weight, HALIDE_FAMILY.cue);
    }
    if SCREW_BASES.iter().any(|base| normalized.contains(base)) {
        signal.add(-thresholds.screw_base_weight, SCREW_BASE_CUE);
    }

    signal
}

fn family_matches(tokens: &[&str], family: &KeywordFamily) -> bool {
    family
        .keywords
        .iter()
        .any(|keyword| contains_sequence(tokens, keyword))
}

fn contains_sequence(tokens: &[&str], keyword: Keyword) -> bool {
    tokens
        .windows(keyword.len())
        .any(|window| window == keyword)
}
