//! Per-bucket frequency analysis: token and bigram tables, lexical
//! diversity, most-liked comments and the daily time series.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;

use crate::comment::{NormalizedComment, Schema};
use crate::config::{DEFAULT_TOP_LIKED, DEFAULT_TOP_TERMS, PipelineConfig};
use crate::lang::Bucket;
use crate::normalize::tokenize;

/// A term and how often it occurs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermCount {
    pub term: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LikedComment {
    pub like_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub text: String,
    pub clean_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub comment_count: usize,
}

/// Statistics for one bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyReport {
    pub bucket: Bucket,
    pub comment_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_author_count: Option<usize>,
    pub avg_word_count: f64,
    pub avg_char_count: f64,
    pub token_count: usize,
    pub vocabulary_size: usize,
    pub type_token_ratio: f64,
    pub top_tokens: Vec<TermCount>,
    pub top_bigrams: Vec<TermCount>,
    /// Absent when the dataset has no like counts or the bucket is empty.
    pub top_liked: Option<Vec<LikedComment>>,
    /// Absent when the dataset has no timestamps or none of them parse.
    pub daily_counts: Option<Vec<DailyCount>>,
    /// Records left out of `daily_counts` because their timestamp did not parse.
    pub malformed_timestamps: usize,
}

/// Counts terms, keeping them in order of first occurrence.
/// # Example
/// ```
/// use comment_lens::analyze::count_terms;
/// let counted = count_terms(["video", "nice", "video"]);
/// assert_eq!(counted[0].term, "video");
/// assert_eq!(counted[0].count, 2);
/// assert_eq!(counted[1].term, "nice");
/// assert_eq!(counted[1].count, 1);
/// ```
pub fn count_terms<I, S>(terms: I) -> Vec<TermCount>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str> + Into<String>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counted: Vec<TermCount> = Vec::new();
    for term in terms {
        match index.get(term.as_ref()) {
            Some(&i) => counted[i].count += 1,
            None => {
                let term: String = term.into();
                index.insert(term.clone(), counted.len());
                counted.push(TermCount { term, count: 1 });
            }
        }
    }
    counted
}

/// Sorts by descending count. The sort is stable, so equal counts keep their
/// first-occurrence order.
/// # Example
/// ```
/// use comment_lens::analyze::{count_terms, sort_by_frequency};
/// let sorted = sort_by_frequency(count_terms(["one", "two", "three", "two"]));
/// let terms: Vec<&str> = sorted.iter().map(|t| t.term.as_str()).collect();
/// assert_eq!(terms, vec!["two", "one", "three"]);
/// ```
pub fn sort_by_frequency(mut counted: Vec<TermCount>) -> Vec<TermCount> {
    counted.sort_by(|a, b| b.count.cmp(&a.count));
    counted
}

/// Adjacent token pairs joined by a space.
pub fn bigrams(tokens: &[&str]) -> Vec<String> {
    tokens.windows(2).map(|w| format!("{} {}", w[0], w[1])).collect()
}

pub fn type_token_ratio(vocabulary_size: usize, token_count: usize) -> f64 {
    if token_count == 0 {
        0.0
    } else {
        vocabulary_size as f64 / token_count as f64
    }
}

/// Parses a publish timestamp as an instant. Offset-less forms are read as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"] {
        if let Ok(dt) = DateTime::parse_from_str(value, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn mean<I: Iterator<Item = usize>>(values: I, n: usize) -> f64 {
    if n == 0 {
        0.0
    } else {
        values.sum::<usize>() as f64 / n as f64
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Analyzer {
    pub top_terms: usize,
    pub top_liked: usize,
}

impl Default for Analyzer {
    fn default() -> Self {
        Analyzer {
            top_terms: DEFAULT_TOP_TERMS,
            top_liked: DEFAULT_TOP_LIKED,
        }
    }
}

impl Analyzer {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Analyzer {
            top_terms: config.top_terms,
            top_liked: config.top_liked,
        }
    }

    /// Builds the report for the records of one bucket, in input order.
    pub fn analyze(
        &self,
        bucket: Bucket,
        schema: &Schema,
        records: &[NormalizedComment],
    ) -> FrequencyReport {
        let n = records.len();

        let per_record: Vec<Vec<&str>> = records.iter().map(|r| tokenize(&r.clean_text)).collect();
        let all_tokens: Vec<&str> = per_record.iter().flatten().copied().collect();
        let all_bigrams: Vec<String> = per_record.iter().flat_map(|t| bigrams(t)).collect();

        let vocabulary_size = all_tokens.iter().collect::<HashSet<_>>().len();

        let mut top_tokens = sort_by_frequency(count_terms(all_tokens.iter().copied()));
        top_tokens.truncate(self.top_terms);
        let mut top_bigrams = sort_by_frequency(count_terms(all_bigrams));
        top_bigrams.truncate(self.top_terms);

        let unique_author_count = schema.author.then(|| {
            records
                .iter()
                .filter_map(|r| r.raw.author.as_deref())
                .filter(|a| !a.is_empty())
                .collect::<HashSet<_>>()
                .len()
        });

        let top_liked = (schema.like_count && n > 0).then(|| self.top_liked(records));

        let (daily_counts, malformed_timestamps) = if schema.published_at {
            daily_counts(records)
        } else {
            (None, 0)
        };

        FrequencyReport {
            bucket,
            comment_count: n,
            unique_author_count,
            avg_word_count: mean(records.iter().map(|r| r.word_count()), n),
            avg_char_count: mean(records.iter().map(|r| r.char_count()), n),
            token_count: all_tokens.len(),
            vocabulary_size,
            type_token_ratio: type_token_ratio(vocabulary_size, all_tokens.len()),
            top_tokens,
            top_bigrams,
            top_liked,
            daily_counts,
            malformed_timestamps,
        }
    }

    fn top_liked(&self, records: &[NormalizedComment]) -> Vec<LikedComment> {
        let mut sorted: Vec<&NormalizedComment> = records.iter().collect();
        // None sorts below Some, so records without a like count end up last
        sorted.sort_by(|a, b| b.raw.like_count.cmp(&a.raw.like_count));
        sorted
            .into_iter()
            .take(self.top_liked)
            .map(|r| LikedComment {
                like_count: r.raw.like_count,
                published_at: r.raw.published_at.clone(),
                author: r.raw.author.clone(),
                text: r.raw.text.clone(),
                clean_text: r.clean_text.clone(),
            })
            .collect()
    }
}

/// Comments per UTC calendar date, plus the number of unparseable timestamps.
fn daily_counts(records: &[NormalizedComment]) -> (Option<Vec<DailyCount>>, usize) {
    let mut per_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    let mut malformed = 0;
    for value in records.iter().filter_map(|r| r.raw.published_at.as_deref()) {
        if value.trim().is_empty() {
            continue;
        }
        match parse_timestamp(value) {
            Some(ts) => *per_day.entry(ts.date_naive()).or_insert(0) += 1,
            None => malformed += 1,
        }
    }
    if per_day.is_empty() {
        return (None, malformed);
    }
    let series = per_day
        .into_iter()
        .map(|(date, comment_count)| DailyCount {
            date,
            comment_count,
        })
        .collect();
    (Some(series), malformed)
}
