#![forbid(unsafe_code)]
//! # comment_lens
//!
//! Language bucketing and frequency analysis for multilingual short comments.
//!
//! A batch of comments goes through five stages:
//! 1. a confidence-gated language classifier ([`Classifier`]),
//! 2. an adaptive planner choosing which languages get a bucket ([`plan`]),
//! 3. bucket assignment ([`assign`]),
//! 4. language-aware normalization ([`Normalizer`]),
//! 5. per-bucket frequency analysis ([`Analyzer`]).
//!
//! [`run`] wires them together from an immutable [`PipelineConfig`] and the
//! injected [`Resources`] (language identifier, stemmers, transliterator).
//!
//! ## Example
//! ```no_run
//! use comment_lens::{PipelineConfig, Resources, read_corpus, run};
//!
//! let corpus = read_corpus("raw/all.csv").unwrap();
//! let config = PipelineConfig::default();
//! let resources = Resources::standard(&config);
//! let output = run(&corpus, &config, &resources).unwrap();
//! for (bucket, report) in &output.reports {
//!     println!("{bucket}: {} comments, TTR {:.4}", report.comment_count, report.type_token_ratio);
//! }
//! ```

pub mod analyze;
pub mod bucket;
pub mod classify;
pub mod comment;
pub mod config;
pub mod error;
pub mod export;
pub mod lang;
pub mod normalize;
pub mod pipeline;

pub use analyze::{Analyzer, DailyCount, FrequencyReport, LikedComment, TermCount, bigrams};
pub use bucket::{BucketPlan, LanguageDistribution, assign, plan};
pub use classify::{Candidate, Classifier, LanguageIdentifier, WhatlangIdentifier, is_low_signal};
pub use comment::{
    BucketedComment, ClassifiedComment, Corpus, NormalizedComment, RawComment, Schema,
};
pub use config::{GateConfig, PipelineConfig};
pub use error::{PipelineError, PipelineWarning, Result};
pub use export::{
    csv_safe_cell, dedup_by_id, format_distribution, format_report, read_corpus, write_run,
};
pub use lang::{Bucket, Language, LanguageLabel};
pub use normalize::{
    DiacriticFolder, Normalizer, SnowballStemmer, TokenStemmer, Transliterator, tokenize,
};
pub use pipeline::{PipelineOutput, Resources, partition, run};
