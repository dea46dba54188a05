//! Confidence-gated language classification.
//!
//! A text is only sent to the identifier once it carries enough signal
//! (enough word tokens and enough letters). Low-confidence answers collapse to
//! `unknown`; confident answers outside the primary subset become `other`.

use std::sync::LazyLock;

use log::debug;
use rayon::prelude::*;
use regex::Regex;
use whatlang::Detector;

use crate::comment::{ClassifiedComment, RawComment};
use crate::config::GateConfig;
use crate::error::Result;
use crate::lang::{Language, LanguageLabel};

static WORD_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").unwrap());

/// One ranked answer from a language identifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub language: Language,
    pub confidence: f64,
}

/// Anything able to rank languages for a text.
pub trait LanguageIdentifier: Send + Sync {
    /// Returns candidates ranked best first. An empty list means no opinion.
    fn identify(&self, text: &str) -> Result<Vec<Candidate>>;
}

/// Trigram identifier backed by `whatlang`, restricted to the supported set.
pub struct WhatlangIdentifier {
    detector: Detector,
}

impl WhatlangIdentifier {
    pub fn new(supported: &[Language]) -> Self {
        let allowlist = supported.iter().map(|l| l.to_whatlang()).collect();
        WhatlangIdentifier {
            detector: Detector::with_allowlist(allowlist),
        }
    }
}

impl LanguageIdentifier for WhatlangIdentifier {
    fn identify(&self, text: &str) -> Result<Vec<Candidate>> {
        let candidates = self
            .detector
            .detect(text)
            .and_then(|info| {
                Language::from_whatlang(info.lang()).map(|language| Candidate {
                    language,
                    confidence: info.confidence(),
                })
            })
            .into_iter()
            .collect();
        Ok(candidates)
    }
}

/// True when the text is too short or too sparse to identify reliably.
/// # Example
/// ```
/// use comment_lens::is_low_signal;
/// assert!(is_low_signal("ok", 2, 8));
/// assert!(!is_low_signal("nice video thanks", 2, 8));
/// ```
pub fn is_low_signal(text: &str, min_words: usize, min_alpha_chars: usize) -> bool {
    let text = text.trim();
    if text.is_empty() {
        return true;
    }
    if WORD_TOKEN.find_iter(text).take(min_words).count() < min_words {
        return true;
    }
    text.chars().filter(|c| c.is_alphabetic()).take(min_alpha_chars).count() < min_alpha_chars
}

pub struct Classifier<'a> {
    gate: &'a GateConfig,
    identifier: &'a dyn LanguageIdentifier,
}

impl<'a> Classifier<'a> {
    pub fn new(gate: &'a GateConfig, identifier: &'a dyn LanguageIdentifier) -> Self {
        Classifier { gate, identifier }
    }

    /// Label for a single text. Identifier failures are returned, not swallowed.
    pub fn classify(&self, text: &str) -> Result<LanguageLabel> {
        if is_low_signal(text, self.gate.min_words, self.gate.min_alpha_chars) {
            return Ok(LanguageLabel::Unknown);
        }

        let candidates = self.identifier.identify(text)?;
        let top = candidates
            .iter()
            .filter(|c| self.gate.supported.contains(&c.language))
            .max_by(|a, b| a.confidence.total_cmp(&b.confidence));

        let Some(top) = top else {
            return Ok(LanguageLabel::Unknown);
        };
        if top.confidence < self.gate.min_confidence {
            debug!(
                "top candidate {} at {:.3} is below {:.2}",
                top.language, top.confidence, self.gate.min_confidence
            );
            return Ok(LanguageLabel::Unknown);
        }

        if self.gate.primary.contains(&top.language) {
            Ok(LanguageLabel::Detected(top.language))
        } else {
            Ok(LanguageLabel::Other)
        }
    }

    /// Classifies every comment, preserving input order. Any identifier
    /// failure aborts the whole pass.
    pub fn classify_all(&self, comments: &[RawComment]) -> Result<Vec<ClassifiedComment>> {
        comments
            .par_iter()
            .map(|raw| -> Result<ClassifiedComment> {
                Ok(ClassifiedComment {
                    detected_language: self.classify(&raw.text)?,
                    raw: raw.clone(),
                })
            })
            .collect()
    }
}
