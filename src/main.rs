//! # Failbook CLI (`failbook`)
//!
//! Maintenance tooling for a catalog of failed machine-learning
//! experiments: every submission is a markdown file with YAML front
//! matter under `submissions/<YYYY>/`.
//!
//! ## Usage
//!
//! ```bash
//! failbook --config ./config/failbook.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `failbook validate [FILES..]` | Check naming, front matter, sections, and content quality |
//! | `failbook dedup [FILES..]` | Flag submissions that duplicate existing ones |
//! | `failbook links [FILES..]` | Check that links in submissions resolve |
//! | `failbook index` | Regenerate the README category and recent lists |
//! | `failbook digest` | Write the weekly summary |
//!
//! Commands that report findings exit with status 1 when they find any.
//!
//! ## Examples
//!
//! ```bash
//! # Validate a new submission
//! failbook validate submissions/2024/vit_overfit.md
//!
//! # Duplicate check with a stricter title threshold, as JSON
//! failbook dedup submissions/2024/vit_overfit.md --title-threshold 0.9 --format json
//!
//! # Digest covering the last two weeks
//! failbook digest --days 14
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use failbook::config::{self, Config};
use failbook::dedup::OutputFormat;
use failbook::{dedup, digest, index, links, telemetry, validate};

const DEFAULT_CONFIG_PATH: &str = "./config/failbook.toml";

/// Failbook: keeps a catalog of failed ML experiments tidy.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. Without it, `./config/failbook.toml` is used when present and
/// built-in defaults otherwise.
#[derive(Parser)]
#[command(
    name = "failbook",
    about = "Validation, duplicate detection, and reporting for a catalog of failed ML experiments",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at DEBUG level.
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate submission files.
    ///
    /// Without arguments every file under the submissions directory is
    /// checked.
    Validate {
        /// Files to validate.
        files: Vec<PathBuf>,
    },

    /// Check submissions for duplicates of existing entries.
    ///
    /// Each file is compared with the whole catalog by exact content hash,
    /// title similarity, and body similarity.
    Dedup {
        /// Files to check. Defaults to every submission.
        files: Vec<PathBuf>,

        /// Report format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Title similarity at or above which entries are duplicates.
        #[arg(long)]
        title_threshold: Option<f64>,

        /// Body similarity at or above which entries are duplicates.
        #[arg(long)]
        content_threshold: Option<f64>,

        /// Minimum body length (characters) for the body comparison.
        #[arg(long)]
        min_content_length: Option<usize>,
    },

    /// Check links in submission files.
    Links {
        /// Files to check. Defaults to every submission.
        files: Vec<PathBuf>,
    },

    /// Regenerate the README index sections.
    Index,

    /// Write the weekly summary.
    Digest {
        /// Look-back window in days.
        #[arg(long)]
        days: Option<i64>,
    },
}

fn load(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => config::load_config(path),
        None => config::load_config_or_default(Path::new(DEFAULT_CONFIG_PATH)),
    }
}

fn exit_code(ok: bool) -> ExitCode {
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    telemetry::init_tracing(cli.log_json, telemetry::level_for(cli.verbose));

    let mut cfg = load(cli.config.as_deref())?;

    match cli.command {
        Commands::Validate { files } => Ok(exit_code(validate::run_validate(&cfg, &files)?)),
        Commands::Dedup {
            files,
            format,
            title_threshold,
            content_threshold,
            min_content_length,
        } => {
            if let Some(t) = title_threshold {
                cfg.dedup.title_threshold = t;
            }
            if let Some(t) = content_threshold {
                cfg.dedup.content_threshold = t;
            }
            if let Some(n) = min_content_length {
                cfg.dedup.min_content_length = n;
            }
            config::validate_config(&cfg)?;
            Ok(exit_code(dedup::run_dedup(&cfg, &files, format)?))
        }
        Commands::Links { files } => Ok(exit_code(links::run_links(&cfg, &files).await?)),
        Commands::Index => {
            index::run_index(&cfg)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Digest { days } => {
            if let Some(days) = days {
                cfg.digest.window_days = days;
            }
            config::validate_config(&cfg)?;
            digest::run_digest(&cfg)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
