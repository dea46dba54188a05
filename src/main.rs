#![forbid(unsafe_code)]
//! # comment_lens CLI
//!
//! Reads a comment export (CSV with at least a `text` column), buckets the
//! comments by language and writes processed tables plus per-bucket reports
//! into a timestamped run directory.
//!
//! ## Example
//! ```bash
//! RUST_LOG=info cargo run --release -- raw/all.csv --out runs --threshold 0.2 --stem
//! ```
//!
//! See `--help` for all available options.

use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use comment_lens::{
    Language, PipelineConfig, Resources, format_distribution, format_report, read_corpus, run,
    write_run,
};
use log::error;

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// CSV file with the comments to analyze
    input: PathBuf,

    /// Directory receiving the run folder
    #[arg(long, default_value = "runs")]
    out: PathBuf,

    /// Name appended to the run folder (defaults to the input file stem)
    #[arg(long)]
    tag: Option<String>,

    /// Minimum corpus share for a language to get its own bucket
    #[arg(long, default_value_t = comment_lens::config::DEFAULT_ANALYZE_THRESHOLD)]
    threshold: f64,

    /// Minimum identifier confidence; below it a comment is `unknown`
    #[arg(long, default_value_t = comment_lens::config::DEFAULT_MIN_CONFIDENCE)]
    min_confidence: f64,

    /// Minimum number of word tokens before identification is attempted
    #[arg(long, default_value_t = comment_lens::config::DEFAULT_MIN_WORDS)]
    min_words: usize,

    /// Minimum number of letters before identification is attempted
    #[arg(long, default_value_t = comment_lens::config::DEFAULT_MIN_ALPHA_CHARS)]
    min_alpha: usize,

    /// Languages keeping their own code, comma separated (others become `other`)
    #[arg(long, value_delimiter = ',', default_value = "tr,en")]
    primary: Vec<String>,

    /// Apply Snowball stemming in the Turkish and English buckets (default: false)
    #[arg(long, default_value_t = false)]
    stem: bool,

    /// Remove emoji before cleaning (default: false)
    #[arg(long, default_value_t = false)]
    strip_emoji: bool,
}

fn build_config(cli: &Cli) -> Result<PipelineConfig, String> {
    let mut config = PipelineConfig {
        analyze_threshold: cli.threshold,
        stem: cli.stem,
        strip_emoji: cli.strip_emoji,
        ..Default::default()
    };
    config.gate.min_confidence = cli.min_confidence;
    config.gate.min_words = cli.min_words;
    config.gate.min_alpha_chars = cli.min_alpha;
    config.gate.primary = cli
        .primary
        .iter()
        .map(|code| Language::from_code(code).ok_or_else(|| format!("unsupported language code '{code}'")))
        .collect::<Result<_, _>>()?;
    Ok(config)
}

fn run_tag(cli: &Cli) -> String {
    cli.tag.clone().unwrap_or_else(|| {
        Path::new(&cli.input)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "run".to_string())
    })
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let config = match build_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            error!("Error: {}", e);
            process::exit(1);
        }
    };

    let result = read_corpus(&cli.input).and_then(|corpus| {
        let resources = Resources::standard(&config);
        let output = run(&corpus, &config, &resources)?;
        let run_path = write_run(&cli.out, &run_tag(&cli), &cli.input, &config, &output)?;
        Ok((output, run_path))
    });

    match result {
        Ok((output, run_path)) => {
            println!("{}", format_distribution(&output, config.analyze_threshold));
            for report in output.reports.values() {
                println!("{}", format_report(report));
            }
            for w in &output.warnings {
                println!("warning: {w}");
            }
            println!("Results in: {}", run_path.display());
        }
        Err(e) => {
            error!("Error analyzing {}: {}", cli.input.display(), e);
            process::exit(1);
        }
    }
}
