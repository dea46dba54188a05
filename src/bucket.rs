//! Corpus language distribution, adaptive bucket planning and assignment.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::comment::ClassifiedComment;
use crate::lang::{Bucket, Language, LanguageLabel};

/// Count of comments per detected label, including the sentinels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LanguageDistribution {
    counts: BTreeMap<LanguageLabel, usize>,
}

impl LanguageDistribution {
    pub fn from_labels<I>(labels: I) -> Self
    where
        I: IntoIterator<Item = LanguageLabel>,
    {
        let mut counts = BTreeMap::new();
        for label in labels {
            *counts.entry(label).or_insert(0) += 1;
        }
        LanguageDistribution { counts }
    }

    pub fn from_classified(comments: &[ClassifiedComment]) -> Self {
        Self::from_labels(comments.iter().map(|c| c.detected_language))
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn count(&self, label: LanguageLabel) -> usize {
        self.counts.get(&label).copied().unwrap_or(0)
    }

    /// Share of `label` in the whole corpus; 0.0 for an empty corpus.
    pub fn share(&self, label: LanguageLabel) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.count(label) as f64 / total as f64,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (LanguageLabel, usize)> + '_ {
        self.counts.iter().map(|(l, c)| (*l, *c))
    }

    /// Labels ordered by descending count, then by label.
    pub fn sorted_by_count(&self) -> Vec<(LanguageLabel, usize)> {
        let mut v: Vec<(LanguageLabel, usize)> = self.iter().collect();
        v.sort_by(|a, b| b.1.cmp(&a.1));
        v
    }
}

/// Languages that get a dedicated bucket for this run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BucketPlan {
    languages: BTreeSet<Language>,
}

impl BucketPlan {
    pub fn contains(&self, language: Language) -> bool {
        self.languages.contains(&language)
    }

    pub fn languages(&self) -> impl Iterator<Item = Language> + '_ {
        self.languages.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.languages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }
}

impl FromIterator<Language> for BucketPlan {
    fn from_iter<I: IntoIterator<Item = Language>>(iter: I) -> Self {
        BucketPlan {
            languages: iter.into_iter().collect(),
        }
    }
}

/// Selects every detected language whose share of the whole corpus
/// (sentinels included in the denominator) reaches `threshold`.
/// # Example
/// ```
/// use comment_lens::{Language, LanguageDistribution, LanguageLabel, plan};
/// let dist = LanguageDistribution::from_labels([
///     LanguageLabel::Detected(Language::Turkish),
///     LanguageLabel::Detected(Language::Turkish),
///     LanguageLabel::Detected(Language::English),
///     LanguageLabel::Unknown,
///     LanguageLabel::Unknown,
/// ]);
/// let chosen = plan(&dist, 0.25);
/// assert!(chosen.contains(Language::Turkish));
/// assert!(!chosen.contains(Language::English));
/// ```
pub fn plan(distribution: &LanguageDistribution, threshold: f64) -> BucketPlan {
    if distribution.total() == 0 {
        return BucketPlan::default();
    }
    distribution
        .iter()
        .filter_map(|(label, _)| match label {
            LanguageLabel::Detected(l) if distribution.share(label) >= threshold => Some(l),
            _ => None,
        })
        .collect()
}

/// Routes a detected label to its bucket. `unknown` always stays `unknown`.
pub fn assign(label: LanguageLabel, plan: &BucketPlan) -> Bucket {
    match label {
        LanguageLabel::Unknown => Bucket::Unknown,
        LanguageLabel::Detected(l) if plan.contains(l) => Bucket::Language(l),
        _ => Bucket::Others,
    }
}
