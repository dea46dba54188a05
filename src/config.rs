//! Run configuration. Built once and passed by reference into the pipeline so
//! that runs with different thresholds never share state.

use std::collections::HashSet;

use serde::Serialize;

use crate::error::{PipelineError, Result};
use crate::lang::Language;

pub const DEFAULT_ANALYZE_THRESHOLD: f64 = 0.20;
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.35;
pub const DEFAULT_MIN_WORDS: usize = 2;
pub const DEFAULT_MIN_ALPHA_CHARS: usize = 8;
pub const DEFAULT_TOP_TERMS: usize = 50;
pub const DEFAULT_TOP_LIKED: usize = 15;

const TURKISH_STOPWORDS: &[&str] = &[
    "ve", "ile", "ama", "fakat", "çünkü", "çok", "bir", "bu", "şu", "o", "da", "de", "mi", "mı",
    "mu", "mü", "için", "gibi", "daha", "en", "şey", "ben", "sen", "biz", "siz", "onlar", "var",
    "yok", "olan", "olarak", "ya", "ki",
];

const ENGLISH_STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "because", "so", "to", "of", "in", "on", "for", "with",
    "is", "are", "was", "were", "be", "been", "it", "this", "that", "i", "you", "we", "they",
    "my", "your", "our", "their",
];

fn word_set(words: &[&str]) -> HashSet<String> {
    words.iter().map(|w| w.to_string()).collect()
}

/// Settings of the confidence-gated classifier.
#[derive(Debug, Clone, Serialize)]
pub struct GateConfig {
    /// Texts with fewer word tokens are `unknown` without asking the identifier.
    pub min_words: usize,
    /// Texts with fewer alphabetic characters are `unknown` as well.
    pub min_alpha_chars: usize,
    /// Top candidates below this confidence are `unknown`.
    pub min_confidence: f64,
    /// Languages the identifier may answer with.
    pub supported: Vec<Language>,
    /// Languages that keep their own code; other confident answers become `other`.
    pub primary: Vec<Language>,
}

impl Default for GateConfig {
    fn default() -> Self {
        GateConfig {
            min_words: DEFAULT_MIN_WORDS,
            min_alpha_chars: DEFAULT_MIN_ALPHA_CHARS,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            supported: Language::ALL.to_vec(),
            primary: vec![Language::Turkish, Language::English],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineConfig {
    pub gate: GateConfig,
    /// Minimum corpus share for a language to get its own bucket.
    pub analyze_threshold: f64,
    pub stem: bool,
    pub strip_emoji: bool,
    pub top_terms: usize,
    pub top_liked: usize,
    #[serde(skip)]
    pub turkish_stopwords: HashSet<String>,
    #[serde(skip)]
    pub english_stopwords: HashSet<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            gate: GateConfig::default(),
            analyze_threshold: DEFAULT_ANALYZE_THRESHOLD,
            stem: false,
            strip_emoji: false,
            top_terms: DEFAULT_TOP_TERMS,
            top_liked: DEFAULT_TOP_LIKED,
            turkish_stopwords: word_set(TURKISH_STOPWORDS),
            english_stopwords: word_set(ENGLISH_STOPWORDS),
        }
    }
}

impl PipelineConfig {
    /// Rejects values that would make the run meaningless.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.analyze_threshold) {
            return Err(PipelineError::Configuration(format!(
                "analyze threshold must be within [0, 1], got {}",
                self.analyze_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.gate.min_confidence) {
            return Err(PipelineError::Configuration(format!(
                "minimum confidence must be within [0, 1], got {}",
                self.gate.min_confidence
            )));
        }
        if self.gate.supported.is_empty() {
            return Err(PipelineError::Configuration(
                "at least one supported language is required".to_string(),
            ));
        }
        if let Some(l) = self
            .gate
            .primary
            .iter()
            .find(|l| !self.gate.supported.contains(l))
        {
            return Err(PipelineError::Configuration(format!(
                "primary language '{l}' is not in the supported set"
            )));
        }
        Ok(())
    }

    /// Stop words applied in the given language's bucket, if that language has a stage.
    pub fn stopwords_for(&self, language: Language) -> Option<&HashSet<String>> {
        match language {
            Language::Turkish => Some(&self.turkish_stopwords),
            Language::English => Some(&self.english_stopwords),
            _ => None,
        }
    }
}
