//! Integration tests for `comment_lens`.
//
// This suite verifies:
// - CSV ingest (schema detection, identity de-duplication, fatal input errors)
// - The full pipeline on a deterministic identifier (buckets, reports, warnings)
// - Run-directory persistence (processed tables, report files, meta.json)
// - CLI behavior with the bundled whatlang identifier
//
// Notes:
// - Library tests use a vocabulary-based identifier so results never depend on
//   a statistical model.
// - CLI tests write into a temp dir passed with --out; no global CWD change.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::prelude::*;
use assert_fs::prelude::*;
use predicates::prelude::*;
use serde_json::Value as Json;
use tempfile::tempdir;

use comment_lens::{
    Bucket, Candidate, Language, LanguageIdentifier, PipelineConfig, PipelineError, Resources,
    Result, csv_safe_cell, read_corpus, run, write_run,
};

// --------------------- helpers ---------------------

/// Create a file with content in a temp dir.
fn write_file(dir: &assert_fs::TempDir, name: &str, content: &str) -> PathBuf {
    let f = dir.child(name);
    f.write_str(content).unwrap();
    f.path().to_path_buf()
}

/// The single run folder created under `out`.
fn only_run_dir(out: &Path) -> PathBuf {
    let dirs: Vec<PathBuf> = fs::read_dir(out)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    assert_eq!(dirs.len(), 1, "expected exactly one run folder in {}", out.display());
    dirs.into_iter().next().unwrap()
}

fn read_json(p: &Path) -> Json {
    serde_json::from_str(&fs::read_to_string(p).unwrap()).expect("valid json")
}

/// Run CLI successfully.
fn run_cli_ok(args: &[&str]) -> assert_cmd::assert::Assert {
    let mut cmd = std::process::Command::cargo_bin("comment_lens").unwrap();
    cmd.args(args).assert().success()
}

/// Run CLI expecting failure.
fn run_cli_fail(args: &[&str]) -> assert_cmd::assert::Assert {
    let mut cmd = std::process::Command::cargo_bin("comment_lens").unwrap();
    cmd.args(args).assert().failure()
}

/// Answers by vocabulary: Turkish markers, a German marker, English otherwise.
struct Vocabulary;

impl LanguageIdentifier for Vocabulary {
    fn identify(&self, text: &str) -> Result<Vec<Candidate>> {
        let lower = text.to_lowercase();
        let language = if ["güzel", "teşekkür", "harika"].iter().any(|w| lower.contains(w)) {
            Language::Turkish
        } else if lower.contains("danke") {
            Language::German
        } else {
            Language::English
        };
        Ok(vec![Candidate {
            language,
            confidence: 0.9,
        }])
    }
}

const FULL_CSV: &str = "\
comment_id,parent_id,author,like_count,published_at,text
c1,,ayse,12,2024-05-01T10:00:00Z,\"Çok güzel bir video, teşekkürler!\"
c2,c1,john,3,2024-05-01T12:30:00Z,nice video thanks!!
c3,,mehmet,0,2024-05-02T08:00:00Z,ok
c4,,ayse,40,2024-05-02T09:00:00Z,Harika anlatım çoooook güzel
c1,,ayse,12,2024-05-01T10:00:00Z,duplicate of the first comment
c5,,anna,7,garbage,Schönes Video danke dir
";

// --------------------- library tests ---------------------

#[test]
fn lib_read_corpus_detects_schema_and_dedups() {
    let td = assert_fs::TempDir::new().unwrap();
    let p = write_file(&td, "all.csv", FULL_CSV);
    let corpus = read_corpus(&p).unwrap();

    assert_eq!(corpus.len(), 5);
    assert!(corpus.schema.like_count);
    assert!(corpus.schema.published_at);
    assert!(corpus.schema.author);
    assert_eq!(corpus.comments[0].text, "Çok güzel bir video, teşekkürler!");
    assert!(corpus.comments[0].is_top_level());
    assert_eq!(corpus.comments[1].parent_id.as_deref(), Some("c1"));
    assert_eq!(corpus.comments[3].like_count, Some(40));
}

#[test]
fn lib_missing_text_column_is_a_configuration_error() {
    let td = assert_fs::TempDir::new().unwrap();
    let p = write_file(&td, "bad.csv", "comment_id,body\n1,hello there friends\n");
    assert!(matches!(
        read_corpus(&p),
        Err(PipelineError::Configuration(_))
    ));
}

#[test]
fn lib_malformed_row_is_fatal() {
    let td = assert_fs::TempDir::new().unwrap();
    let p = write_file(
        &td,
        "bad.csv",
        "comment_id,like_count,text\n1,many,hello there friends\n",
    );
    assert!(matches!(read_corpus(&p), Err(PipelineError::Csv(_))));
}

#[test]
fn lib_padded_headers_still_carry_their_columns() {
    let td = tempdir().unwrap();
    let p = td.path().join("padded.csv");
    fs::write(&p, "comment_id , text,like_count\nc1,nice video thanks a lot,4\n").unwrap();
    let corpus = read_corpus(&p).unwrap();

    assert!(corpus.schema.text);
    assert!(corpus.schema.like_count);
    assert_eq!(corpus.comments[0].id, "c1");
    assert_eq!(corpus.comments[0].text, "nice video thanks a lot");
    assert_eq!(corpus.comments[0].like_count, Some(4));
}

#[test]
fn lib_comment_id_wins_over_generic_id_column() {
    let td = tempdir().unwrap();
    let p = td.path().join("both_ids.csv");
    fs::write(
        &p,
        "id,comment_id,text\n1,c1,nice video thanks a lot\n2,c1,same comment again\n3,,no comment id here\n",
    )
    .unwrap();
    let corpus = read_corpus(&p).unwrap();

    let ids: Vec<&str> = corpus.comments.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["c1", "3"]);
    assert_eq!(corpus.comments[0].text, "nice video thanks a lot");
}

#[test]
fn lib_pipeline_end_to_end() {
    let td = assert_fs::TempDir::new().unwrap();
    let p = write_file(&td, "all.csv", FULL_CSV);
    let corpus = read_corpus(&p).unwrap();
    let config = PipelineConfig::default();
    let resources = Resources::with_identifier(Box::new(Vocabulary));
    let out = run(&corpus, &config, &resources).unwrap();

    // tr: 2/5, en: 1/5, other: 1/5, unknown: 1/5
    assert!(out.plan.contains(Language::Turkish));
    assert!(out.plan.contains(Language::English));
    assert_eq!(out.comment_count(), 5);

    let tr = out.bucket("tr").unwrap();
    assert_eq!(tr.len(), 2);
    assert_eq!(tr[1].clean_text, "harika anlatım çook güzel");
    assert_eq!(out.bucket("others").unwrap()[0].raw.id, "c5");
    assert_eq!(out.bucket("unknown").unwrap()[0].raw.id, "c3");

    let report = out.report("tr").unwrap();
    assert_eq!(report.comment_count, 2);
    assert_eq!(report.unique_author_count, Some(1));
    assert_eq!(report.top_tokens[0].term, "güzel");
    assert_eq!(report.top_tokens[0].count, 2);
    let liked = report.top_liked.as_ref().unwrap();
    assert_eq!(liked[0].like_count, Some(40));
    let daily = report.daily_counts.as_ref().unwrap();
    assert_eq!(daily.len(), 2);

    // the unparseable timestamp only affects the daily series of its bucket
    let others = out.report("others").unwrap();
    assert!(others.daily_counts.is_none());
    assert_eq!(others.malformed_timestamps, 1);
    assert_eq!(out.warnings.len(), 1);
}

#[test]
fn lib_text_only_schema_never_produces_optional_artifacts() {
    let td = assert_fs::TempDir::new().unwrap();
    let p = write_file(
        &td,
        "text.csv",
        "text\nnice video thanks a lot\nreally helpful explanation here\n",
    );
    let corpus = read_corpus(&p).unwrap();
    assert!(!corpus.schema.like_count);
    let config = PipelineConfig::default();
    let resources = Resources::with_identifier(Box::new(Vocabulary));
    let out = run(&corpus, &config, &resources).unwrap();

    let report = out.report("en").unwrap();
    assert!(report.top_liked.is_none());
    assert!(report.daily_counts.is_none());
    assert!(report.unique_author_count.is_none());
    assert_eq!(out.bucket("en").unwrap()[0].raw.id, "row-1");
}

#[test]
fn lib_raising_threshold_collapses_languages_into_others() {
    let td = assert_fs::TempDir::new().unwrap();
    let p = write_file(&td, "all.csv", FULL_CSV);
    let corpus = read_corpus(&p).unwrap();
    let resources = Resources::with_identifier(Box::new(Vocabulary));

    let config = PipelineConfig {
        analyze_threshold: 0.3,
        ..Default::default()
    };
    let out = run(&corpus, &config, &resources).unwrap();
    assert_eq!(out.plan.len(), 1);
    assert!(out.bucket("en").is_none());
    let others = out.bucket("others").unwrap();
    assert_eq!(others.len(), 2);
    // no English stop-word or transliteration stage outside the en bucket
    assert!(others.iter().any(|c| c.clean_text == "nice video thanks"));
    assert!(out.buckets.contains_key(&Bucket::Unknown));
}

#[test]
fn lib_write_run_layout() {
    let td = assert_fs::TempDir::new().unwrap();
    let input = write_file(&td, "all.csv", FULL_CSV);
    let out_dir = td.child("runs");
    let corpus = read_corpus(&input).unwrap();
    let config = PipelineConfig::default();
    let resources = Resources::with_identifier(Box::new(Vocabulary));
    let output = run(&corpus, &config, &resources).unwrap();

    let run_path = write_run(out_dir.path(), "demo", &input, &config, &output).unwrap();
    assert!(run_path.file_name().unwrap().to_string_lossy().ends_with("__demo"));

    for bucket in ["tr", "en", "others", "unknown"] {
        assert!(run_path.join("processed").join(format!("{bucket}.csv")).is_file());
        let reports = run_path.join("reports");
        assert!(reports.join(format!("{bucket}_top_words.csv")).is_file());
        assert!(reports.join(format!("{bucket}_top_bigrams.csv")).is_file());
        assert!(reports.join(format!("{bucket}_top_liked.csv")).is_file());
        assert!(reports.join(format!("{bucket}_basic_report.txt")).is_file());
        assert!(reports.join(format!("{bucket}_report.json")).is_file());
    }
    assert!(!run_path.join("reports").join("others_time_distribution.csv").exists());
    assert!(run_path.join("reports").join("tr_time_distribution.csv").is_file());

    let meta = read_json(&run_path.join("meta.json"));
    assert_eq!(meta["comment_count"], 5);
    assert_eq!(meta["distribution"]["tr"], 2);
    assert_eq!(meta["distribution"]["unknown"], 1);
    assert_eq!(meta["params"]["analyze_threshold"], 0.2);

    let report_txt = fs::read_to_string(run_path.join("reports").join("tr_basic_report.txt")).unwrap();
    assert!(report_txt.starts_with("=== TR REPORT ==="));
    assert!(report_txt.contains("Type-Token Ratio:"));

    let processed = fs::read_to_string(run_path.join("processed").join("tr.csv")).unwrap();
    let header = processed.lines().next().unwrap();
    assert_eq!(
        header,
        "comment_id,parent_id,author,like_count,published_at,text,lang,bucket,clean_text,char_count,word_count"
    );
}

#[test]
fn lib_processed_csv_neutralizes_formulas() {
    let td = assert_fs::TempDir::new().unwrap();
    let input = write_file(
        &td,
        "evil.csv",
        "comment_id,author,text\n1,=HYPERLINK(1),=cmd nice video thanks\n",
    );
    let corpus = read_corpus(&input).unwrap();
    let config = PipelineConfig::default();
    let resources = Resources::with_identifier(Box::new(Vocabulary));
    let output = run(&corpus, &config, &resources).unwrap();
    let run_path = write_run(td.path(), "evil", &input, &config, &output).unwrap();

    let mut rdr = csv::Reader::from_path(run_path.join("processed").join("en.csv")).unwrap();
    let row = rdr.records().next().unwrap().unwrap();
    assert_eq!(&row[2], "'=HYPERLINK(1)");
    assert_eq!(&row[5], "'=cmd nice video thanks");
}

// --------------------- CLI tests ---------------------

const CLI_CSV: &str = "\
comment_id,parent_id,author,like_count,published_at,text
1,,alice,5,2024-06-01T10:00:00Z,This is a really detailed and helpful explanation of the whole topic thank you
2,,bob,9,2024-06-01T11:00:00Z,I watched the entire video twice because the examples were so clear and useful
3,,carol,1,2024-06-02T09:00:00Z,Could you please make another video about the advanced features next time
4,,dave,0,2024-06-02T10:00:00Z,ok
";

#[test]
fn cli_nonexistent_input_fails() {
    let td = assert_fs::TempDir::new().unwrap();
    let bad = td.path().join("does_not_exist.csv");
    run_cli_fail(&[
        bad.to_string_lossy().as_ref(),
        "--out",
        td.path().to_string_lossy().as_ref(),
    ]);
}

#[test]
fn cli_missing_text_column_fails() {
    let td = assert_fs::TempDir::new().unwrap();
    let p = write_file(&td, "bad.csv", "comment_id,body\n1,hello\n");
    let out = td.child("runs");
    run_cli_fail(&[
        p.to_string_lossy().as_ref(),
        "--out",
        out.path().to_string_lossy().as_ref(),
    ]);
    assert!(!out.path().exists());
}

#[test]
fn cli_rejects_out_of_range_threshold() {
    let td = assert_fs::TempDir::new().unwrap();
    let p = write_file(&td, "all.csv", CLI_CSV);
    run_cli_fail(&[
        p.to_string_lossy().as_ref(),
        "--out",
        td.path().to_string_lossy().as_ref(),
        "--threshold",
        "1.5",
    ]);
}

#[test]
fn cli_rejects_unknown_primary_language() {
    let td = assert_fs::TempDir::new().unwrap();
    let p = write_file(&td, "all.csv", CLI_CSV);
    run_cli_fail(&[
        p.to_string_lossy().as_ref(),
        "--out",
        td.path().to_string_lossy().as_ref(),
        "--primary",
        "tr,xx",
    ]);
}

#[test]
fn cli_basic_run_writes_run_folder() {
    let td = assert_fs::TempDir::new().unwrap();
    let p = write_file(&td, "all.csv", CLI_CSV);
    let out = td.child("runs");

    run_cli_ok(&[
        p.to_string_lossy().as_ref(),
        "--out",
        out.path().to_string_lossy().as_ref(),
        "--stem",
    ])
    .stdout(predicate::str::contains("Language distribution"))
    .stdout(predicate::str::contains("Results in:"));

    let run_path = only_run_dir(out.path());
    assert!(run_path.file_name().unwrap().to_string_lossy().ends_with("__all"));

    let meta = read_json(&run_path.join("meta.json"));
    assert_eq!(meta["comment_count"], 4);
    assert_eq!(meta["params"]["stem"], true);
    let buckets = meta["buckets"].as_object().unwrap();
    let total: u64 = buckets.values().map(|v| v.as_u64().unwrap()).sum();
    assert_eq!(total, 4);
    // "ok" is below the signal gate whatever the model says
    assert!(buckets["unknown"].as_u64().unwrap() >= 1);
    assert!(run_path.join("processed").join("unknown.csv").is_file());
    assert!(run_path.join("reports").join("unknown_basic_report.txt").is_file());
}

#[test]
fn cli_custom_tag_names_the_run() {
    let td = assert_fs::TempDir::new().unwrap();
    let p = write_file(&td, "all.csv", CLI_CSV);
    let out = td.child("runs");
    run_cli_ok(&[
        p.to_string_lossy().as_ref(),
        "--out",
        out.path().to_string_lossy().as_ref(),
        "--tag",
        "video42",
        "--strip-emoji",
    ]);
    let run_path = only_run_dir(out.path());
    assert!(run_path.file_name().unwrap().to_string_lossy().ends_with("__video42"));
}

// --------------------- CSV safety ---------------------

#[test]
fn csv_writer_sanitizes_and_quotes_correctly() {
    let mut buf = Vec::new();
    {
        let mut wtr = csv::WriterBuilder::new().from_writer(&mut buf);
        wtr.write_record(["text", "note"]).unwrap();
        let dangerous = r#"=HYPERLINK("http://x")"#;
        wtr.write_record([csv_safe_cell(dangerous), "ok".to_string()])
            .unwrap();
        wtr.write_record([csv_safe_cell("=BAD\nNEXT"), "1".to_string()])
            .unwrap();
        wtr.flush().unwrap();
    }

    let out = String::from_utf8(buf).unwrap();
    assert!(out.contains(r#"'=HYPERLINK(""http://x"")"#));
    assert!(out.contains("'=BAD\nNEXT"));
}

#[test]
fn no_double_prefix_when_cell_already_safe() {
    assert_eq!(csv_safe_cell("'@SAFE"), "'@SAFE");
    assert_eq!(csv_safe_cell("normal"), "normal");
}
