//! CSV ingest and run-directory persistence around the core pipeline.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{Local, Utc};
use log::info;
use serde::{Deserialize, Serialize};

use crate::analyze::FrequencyReport;
use crate::comment::{Corpus, NormalizedComment, RawComment, Schema};
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::pipeline::PipelineOutput;

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(default)]
    comment_id: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    parent_id: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    like_count: Option<u64>,
    #[serde(default)]
    published_at: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Reads a comment export. A missing `text` column or a malformed row is fatal.
pub fn read_corpus<P: AsRef<Path>>(path: P) -> Result<Corpus> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(false)
        .trim(csv::Trim::Headers)
        .from_path(path.as_ref())?;
    let schema = Schema::from_headers(reader.headers()?.iter());
    if !schema.text {
        return Err(PipelineError::Configuration(format!(
            "{} has no `text` column",
            path.as_ref().display()
        )));
    }

    let mut comments = Vec::new();
    for (line, row) in reader.deserialize::<CsvRow>().enumerate() {
        let row = row?;
        comments.push(RawComment {
            id: non_empty(row.comment_id)
                .or_else(|| non_empty(row.id))
                .unwrap_or_else(|| format!("row-{}", line + 1)),
            parent_id: non_empty(row.parent_id),
            author: non_empty(row.author),
            like_count: row.like_count,
            published_at: non_empty(row.published_at),
            text: row.text.unwrap_or_default(),
        });
    }
    Ok(Corpus::new(schema, dedup_by_id(comments)))
}

/// Drops records whose id was already seen. The first occurrence wins.
pub fn dedup_by_id(comments: Vec<RawComment>) -> Vec<RawComment> {
    let mut seen = HashSet::new();
    comments
        .into_iter()
        .filter(|c| seen.insert(c.id.clone()))
        .collect()
}

/// Prefixes cells that a spreadsheet would evaluate as a formula.
pub fn csv_safe_cell(cell: &str) -> String {
    match cell.chars().next() {
        Some('=' | '+' | '-' | '@' | '\t' | '\r') => format!("'{cell}"),
        _ => cell.to_string(),
    }
}

fn safe(value: &Option<String>) -> Option<String> {
    value.as_deref().map(csv_safe_cell)
}

#[derive(Serialize)]
struct ProcessedRow<'a> {
    comment_id: String,
    parent_id: Option<String>,
    author: Option<String>,
    like_count: Option<u64>,
    published_at: Option<String>,
    text: String,
    lang: &'static str,
    bucket: &'static str,
    clean_text: &'a str,
    char_count: usize,
    word_count: usize,
}

impl<'a> From<&'a NormalizedComment> for ProcessedRow<'a> {
    fn from(c: &'a NormalizedComment) -> Self {
        ProcessedRow {
            comment_id: csv_safe_cell(&c.raw.id),
            parent_id: safe(&c.raw.parent_id),
            author: safe(&c.raw.author),
            like_count: c.raw.like_count,
            published_at: safe(&c.raw.published_at),
            text: csv_safe_cell(&c.raw.text),
            lang: c.detected_language.as_str(),
            bucket: c.bucket.name(),
            clean_text: &c.clean_text,
            char_count: c.char_count(),
            word_count: c.word_count(),
        }
    }
}

fn write_records<P: AsRef<Path>>(path: P, records: &[NormalizedComment]) -> Result<()> {
    let mut w = csv::Writer::from_path(path)?;
    for r in records {
        w.serialize(ProcessedRow::from(r))?;
    }
    w.flush()?;
    Ok(())
}

fn write_table<P, R>(path: P, header: &[&str], rows: R) -> Result<()>
where
    P: AsRef<Path>,
    R: IntoIterator<Item = Vec<String>>,
{
    let mut w = csv::Writer::from_path(path)?;
    w.write_record(header)?;
    for row in rows {
        w.write_record(&row)?;
    }
    w.flush()?;
    Ok(())
}

/// Human-readable summary of one bucket report.
pub fn format_report(report: &FrequencyReport) -> String {
    let mut out = format!("=== {} REPORT ===\n", report.bucket.name().to_uppercase());
    out.push_str(&format!("Comments: {}\n", report.comment_count));
    if let Some(n) = report.unique_author_count {
        out.push_str(&format!("Unique authors: {n}\n"));
    }
    out.push_str(&format!("Avg words: {:.2}\n", report.avg_word_count));
    out.push_str(&format!("Avg chars: {:.2}\n", report.avg_char_count));
    out.push_str(&format!("Vocab size: {}\n", report.vocabulary_size));
    out.push_str(&format!("Type-Token Ratio: {:.4}\n", report.type_token_ratio));
    let top: Vec<String> = report
        .top_tokens
        .iter()
        .take(10)
        .map(|t| format!("{} ({})", t.term, t.count))
        .collect();
    if !top.is_empty() {
        out.push_str(&format!("Top words: {}\n", top.join(", ")));
    }
    out
}

/// Language distribution with shares, one label per line.
pub fn format_distribution(output: &PipelineOutput, threshold: f64) -> String {
    let total = output.distribution.total();
    let mut out = String::from("--- Language distribution ---\n");
    for (label, count) in output.distribution.sorted_by_count() {
        let share = if total == 0 { 0.0 } else { count as f64 / total as f64 };
        out.push_str(&format!("{:8} {:5}  ({:.1}%)\n", label.as_str(), count, share * 100.0));
    }
    let langs: Vec<&str> = output.plan.languages().map(|l| l.code()).collect();
    out.push_str(&format!(
        "Analyze langs (>= {:.0}%): {:?}\n",
        threshold * 100.0,
        langs
    ));
    out
}

#[derive(Serialize)]
struct RunMeta<'a> {
    created_at: String,
    input: String,
    params: &'a PipelineConfig,
    comment_count: usize,
    distribution: BTreeMap<&'static str, usize>,
    analyzed_languages: Vec<&'static str>,
    buckets: BTreeMap<&'static str, usize>,
    warnings: Vec<String>,
}

/// Writes a timestamped run directory under `out_dir` and returns its path.
pub fn write_run(
    out_dir: &Path,
    tag: &str,
    input: &Path,
    config: &PipelineConfig,
    output: &PipelineOutput,
) -> Result<PathBuf> {
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let run_path = out_dir.join(format!("{stamp}__{tag}"));
    let processed = run_path.join("processed");
    let reports = run_path.join("reports");
    fs::create_dir_all(&processed)?;
    fs::create_dir_all(&reports)?;

    for (bucket, records) in &output.buckets {
        let path = processed.join(format!("{}.csv", bucket.name()));
        write_records(&path, records)?;
        info!("saved {:8} -> {} ({})", bucket.name(), path.display(), records.len());
    }

    for (bucket, report) in &output.reports {
        write_report(&reports, bucket.name(), report)?;
    }

    let meta = RunMeta {
        created_at: Utc::now().to_rfc3339(),
        input: input.display().to_string(),
        params: config,
        comment_count: output.comment_count(),
        distribution: output
            .distribution
            .iter()
            .map(|(l, c)| (l.as_str(), c))
            .collect(),
        analyzed_languages: output.plan.languages().map(|l| l.code()).collect(),
        buckets: output
            .buckets
            .iter()
            .map(|(b, v)| (b.name(), v.len()))
            .collect(),
        warnings: output.warnings.iter().map(|w| w.to_string()).collect(),
    };
    let file = fs::File::create(run_path.join("meta.json"))?;
    serde_json::to_writer_pretty(io::BufWriter::new(file), &meta)?;

    Ok(run_path)
}

fn write_report(dir: &Path, tag: &str, report: &FrequencyReport) -> Result<()> {
    let mut files = vec![format!("{tag}_top_words.csv"), format!("{tag}_top_bigrams.csv")];

    write_table(
        dir.join(&files[0]),
        &["word", "count"],
        report
            .top_tokens
            .iter()
            .map(|t| vec![csv_safe_cell(&t.term), t.count.to_string()]),
    )?;
    write_table(
        dir.join(&files[1]),
        &["bigram", "count"],
        report
            .top_bigrams
            .iter()
            .map(|t| vec![csv_safe_cell(&t.term), t.count.to_string()]),
    )?;

    if let Some(liked) = &report.top_liked {
        let name = format!("{tag}_top_liked.csv");
        write_table(
            dir.join(&name),
            &["like_count", "published_at", "author", "text", "clean_text"],
            liked.iter().map(|l| {
                vec![
                    l.like_count.map(|n| n.to_string()).unwrap_or_default(),
                    safe(&l.published_at).unwrap_or_default(),
                    safe(&l.author).unwrap_or_default(),
                    csv_safe_cell(&l.text),
                    csv_safe_cell(&l.clean_text),
                ]
            }),
        )?;
        files.push(name);
    }

    if let Some(daily) = &report.daily_counts {
        let name = format!("{tag}_time_distribution.csv");
        write_table(
            dir.join(&name),
            &["date", "comment_count"],
            daily
                .iter()
                .map(|d| vec![d.date.to_string(), d.comment_count.to_string()]),
        )?;
        files.push(name);
    }

    let json_name = format!("{tag}_report.json");
    let file = fs::File::create(dir.join(&json_name))?;
    serde_json::to_writer_pretty(io::BufWriter::new(file), report)?;
    files.push(json_name);

    let mut text = format_report(report);
    text.push_str("\nOUTPUT FILES:\n");
    for f in &files {
        text.push_str(&format!("- {f}\n"));
    }
    let mut file = fs::File::create(dir.join(format!("{tag}_basic_report.txt")))?;
    file.write_all(text.as_bytes())?;
    Ok(())
}
