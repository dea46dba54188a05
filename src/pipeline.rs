//! Pipeline entry point: classify, plan, assign, normalize, analyze.

use std::collections::{BTreeMap, HashMap};

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::analyze::{Analyzer, FrequencyReport};
use crate::bucket::{self, BucketPlan, LanguageDistribution};
use crate::classify::{Classifier, LanguageIdentifier, WhatlangIdentifier};
use crate::comment::{BucketedComment, Corpus, NormalizedComment};
use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineWarning, Result};
use crate::lang::{Bucket, Language};
use crate::normalize::{DiacriticFolder, Normalizer, SnowballStemmer, TokenStemmer, Transliterator};

/// Injected capabilities. Swapping any of them never touches pipeline logic.
pub struct Resources {
    pub identifier: Box<dyn LanguageIdentifier>,
    pub stemmers: HashMap<Language, Box<dyn TokenStemmer>>,
    pub transliterator: Option<Box<dyn Transliterator>>,
}

impl Resources {
    /// whatlang identification, Snowball stemmers for Turkish and English,
    /// diacritic folding.
    pub fn standard(config: &PipelineConfig) -> Self {
        Self::with_identifier(Box::new(WhatlangIdentifier::new(&config.gate.supported)))
    }

    /// Standard stemmers and transliteration around a caller-supplied identifier.
    pub fn with_identifier(identifier: Box<dyn LanguageIdentifier>) -> Self {
        let mut stemmers: HashMap<Language, Box<dyn TokenStemmer>> = HashMap::new();
        for language in [Language::Turkish, Language::English] {
            if let Some(s) = SnowballStemmer::for_language(language) {
                stemmers.insert(language, Box::new(s));
            }
        }
        Resources {
            identifier,
            stemmers,
            transliterator: Some(Box::new(DiacriticFolder)),
        }
    }
}

/// Everything a run produces, addressable by bucket.
#[derive(Debug)]
pub struct PipelineOutput {
    pub distribution: LanguageDistribution,
    pub plan: BucketPlan,
    pub buckets: BTreeMap<Bucket, Vec<NormalizedComment>>,
    pub reports: BTreeMap<Bucket, FrequencyReport>,
    pub warnings: Vec<PipelineWarning>,
}

impl PipelineOutput {
    pub fn bucket(&self, name: &str) -> Option<&[NormalizedComment]> {
        self.buckets
            .iter()
            .find(|(b, _)| b.name() == name)
            .map(|(_, v)| v.as_slice())
    }

    pub fn report(&self, name: &str) -> Option<&FrequencyReport> {
        self.reports
            .iter()
            .find(|(b, _)| b.name() == name)
            .map(|(_, r)| r)
    }

    pub fn comment_count(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }
}

/// Groups records by bucket, keeping input order inside each group.
pub fn partition(records: Vec<NormalizedComment>) -> BTreeMap<Bucket, Vec<NormalizedComment>> {
    let mut groups: BTreeMap<Bucket, Vec<NormalizedComment>> = BTreeMap::new();
    for r in records {
        groups.entry(r.bucket).or_default().push(r);
    }
    groups
}

/// Runs the whole batch. Fatal errors abort the run; degraded stages are
/// reported in `warnings`.
pub fn run(corpus: &Corpus, config: &PipelineConfig, resources: &Resources) -> Result<PipelineOutput> {
    config.validate()?;
    if !corpus.schema.text {
        return Err(PipelineError::Configuration(
            "input has no `text` field".to_string(),
        ));
    }

    info!("classifying {} comments", corpus.len());
    let classifier = Classifier::new(&config.gate, resources.identifier.as_ref());
    let classified = classifier.classify_all(&corpus.comments)?;

    let distribution = LanguageDistribution::from_classified(&classified);
    let plan = bucket::plan(&distribution, config.analyze_threshold);
    info!(
        "analyzed languages (>= {:.0}%): {:?}",
        config.analyze_threshold * 100.0,
        plan.languages().map(|l| l.code()).collect::<Vec<_>>()
    );

    let bucketed: Vec<BucketedComment> = classified
        .into_iter()
        .map(|c| BucketedComment {
            bucket: bucket::assign(c.detected_language, &plan),
            detected_language: c.detected_language,
            raw: c.raw,
        })
        .collect();

    let normalizer = Normalizer::new(
        config,
        &resources.stemmers,
        resources.transliterator.as_deref(),
    );
    let normalized: Vec<NormalizedComment> = bucketed
        .into_par_iter()
        .map(|c| normalizer.apply(c))
        .collect();
    let buckets = partition(normalized);

    let mut warnings = Vec::new();
    for bucket in buckets.keys() {
        for capability in normalizer.missing_capabilities(bucket) {
            warnings.push(PipelineWarning::MissingCapability {
                capability,
                bucket: bucket.name().to_string(),
            });
        }
    }

    let analyzer = Analyzer::from_config(config);
    let mut reports = BTreeMap::new();
    for (bucket, records) in &buckets {
        let report = analyzer.analyze(*bucket, &corpus.schema, records);
        debug!(
            "{}: {} comments, vocabulary {}, ttr {:.4}",
            bucket, report.comment_count, report.vocabulary_size, report.type_token_ratio
        );
        if report.malformed_timestamps > 0 {
            warnings.push(PipelineWarning::MalformedTimestamp {
                bucket: bucket.name().to_string(),
                dropped: report.malformed_timestamps,
            });
        }
        reports.insert(*bucket, report);
    }

    for w in &warnings {
        warn!("{w}");
    }

    Ok(PipelineOutput {
        distribution,
        plan,
        buckets,
        reports,
        warnings,
    })
}
