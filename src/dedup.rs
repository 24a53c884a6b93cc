//! Duplicate-check reporting.
//!
//! Loads the existing corpus once, checks each input file against it with
//! [`failbook_core::check_batch`], and prints the outcome either as text
//! or as a JSON document on stdout.

use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use failbook_core::{check_batch, has_duplicates, BatchOutcome, DuplicateMatch, MatchReason};

use crate::config::Config;
use crate::submission::{discover_submissions, load_catalog, load_record};

/// Output format for `failbook dedup`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Serialize)]
pub struct DedupReport<'a> {
    pub has_duplicates: bool,
    pub results: Vec<FileResult<'a>>,
}

#[derive(Debug, Serialize)]
pub struct FileResult<'a> {
    pub identity: &'a str,
    #[serde(flatten)]
    pub outcome: FileOutcome<'a>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome<'a> {
    Error { message: &'a str },
    Unique,
    Duplicate { matches: Vec<MatchEntry<'a>> },
}

#[derive(Debug, Serialize)]
pub struct MatchEntry<'a> {
    pub identity: &'a str,
    pub title: &'a str,
    pub reason: MatchReason,
    pub similarity: f64,
}

impl<'a> MatchEntry<'a> {
    fn from_match(m: &DuplicateMatch<'a>) -> Self {
        Self {
            identity: m.existing.identity(),
            title: m.existing.title(),
            reason: m.reason,
            similarity: m.similarity,
        }
    }
}

/// Build the serializable report from batch outcomes.
pub fn build_report<'a>(outcomes: &'a BTreeMap<String, BatchOutcome<'a>>) -> DedupReport<'a> {
    let results = outcomes
        .iter()
        .map(|(identity, outcome)| FileResult {
            identity,
            outcome: match outcome {
                BatchOutcome::LoadError(message) => FileOutcome::Error { message },
                BatchOutcome::Unique => FileOutcome::Unique,
                BatchOutcome::Duplicate(matches) => FileOutcome::Duplicate {
                    matches: matches.iter().map(MatchEntry::from_match).collect(),
                },
            },
        })
        .collect();

    DedupReport {
        has_duplicates: has_duplicates(outcomes),
        results,
    }
}

fn file_name(identity: &str) -> String {
    Path::new(identity)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| identity.to_string())
}

fn print_text(outcomes: &BTreeMap<String, BatchOutcome<'_>>) {
    for (identity, outcome) in outcomes {
        println!("{}", file_name(identity));
        match outcome {
            BatchOutcome::LoadError(message) => println!("   Failed to load submission: {}", message),
            BatchOutcome::Unique => println!("   No duplicates found"),
            BatchOutcome::Duplicate(matches) => {
                println!("   Potential duplicate(s) found:");
                for m in matches {
                    println!("      - {}", file_name(m.existing.identity()));
                    println!("        Reason: {}", m.reason);
                }
            }
        }
        println!();
    }

    println!("{}", "=".repeat(60));
    if has_duplicates(outcomes) {
        println!("Potential duplicates detected!");
        println!("   Please ensure your submission is unique or significantly different.");
    } else {
        println!("No duplicates found. All submissions are unique!");
    }
}

/// Check `files` (or every submission when none are given) against the
/// catalog. Returns `true` when no duplicate was found.
pub fn run_dedup(config: &Config, files: &[PathBuf], format: OutputFormat) -> Result<bool> {
    let files = if files.is_empty() {
        discover_submissions(config)?
    } else {
        files.to_vec()
    };

    if files.is_empty() {
        match format {
            OutputFormat::Text => println!("No files to check for duplicates."),
            OutputFormat::Json => {
                let empty = BTreeMap::new();
                println!("{}", serde_json::to_string_pretty(&build_report(&empty))?);
            }
        }
        return Ok(true);
    }

    let corpus = load_catalog(config)?.records();
    let inputs: Vec<_> = files
        .iter()
        .map(|path| load_record(path, &config.catalog.root))
        .collect();

    tracing::debug!(
        inputs = inputs.len(),
        corpus = corpus.len(),
        title_threshold = config.dedup.title_threshold,
        content_threshold = config.dedup.content_threshold,
        "checking for duplicates"
    );
    let outcomes = check_batch(&inputs, &corpus, &config.dedup);

    match format {
        OutputFormat::Text => {
            println!("Checking {} file(s) for duplicates...", files.len());
            println!();
            print_text(&outcomes);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&build_report(&outcomes))?);
        }
    }

    Ok(!has_duplicates(&outcomes))
}
