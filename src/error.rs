use std::fmt;

use serde::Serialize;

/// Fatal conditions. Any of these aborts the run for the whole corpus.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("language identification failed: {0}")]
    Classification(String),
    #[error("malformed input: {0}")]
    Csv(#[from] csv::Error),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Non-fatal conditions surfaced next to the output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineWarning {
    /// An optional capability was not registered; its stage ran as a no-op.
    MissingCapability {
        capability: &'static str,
        bucket: String,
    },
    /// Records whose timestamp could not be parsed were left out of the daily counts.
    MalformedTimestamp { bucket: String, dropped: usize },
}

impl fmt::Display for PipelineWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineWarning::MissingCapability { capability, bucket } => write!(
                f,
                "{capability} unavailable for bucket '{bucket}', stage skipped"
            ),
            PipelineWarning::MalformedTimestamp { bucket, dropped } => write!(
                f,
                "{dropped} record(s) in bucket '{bucket}' have an unparseable timestamp and are excluded from the daily counts"
            ),
        }
    }
}
