//! Submission discovery and loading.
//!
//! A submission is a markdown file that starts with a YAML front matter
//! block delimited by `---` lines, followed by the write-up body. Files
//! are discovered under the catalog's submissions directory using the
//! configured include/exclude globs.

use anyhow::Result;
use chrono::NaiveDate;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

use failbook_core::{LoadFailure, SubmissionRecord};

use crate::config::Config;

/// Why a submission file could not be loaded.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("front matter is not terminated by a '---' line")]
    UnterminatedFrontMatter,

    #[error("invalid front matter: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    #[error("front matter must be a mapping, got {0}")]
    NotAMapping(&'static str),
}

/// A parsed submission file.
#[derive(Debug, Clone)]
pub struct Submission {
    /// Path as given or discovered.
    pub path: PathBuf,
    /// Path relative to the catalog root, when the file lives under it.
    pub rel_path: PathBuf,
    pub metadata: Mapping,
    /// Body text after the front matter, trimmed.
    pub content: String,
}

impl Submission {
    /// String value of a front matter key. Non-string values yield `None`.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    pub fn title(&self) -> Option<&str> {
        self.str_field("title")
    }

    pub fn category(&self) -> Option<&str> {
        self.str_field("category")
    }

    pub fn author(&self) -> Option<&str> {
        self.str_field("author")
    }

    pub fn github(&self) -> Option<&str> {
        self.str_field("github").filter(|g| !g.is_empty())
    }

    pub fn date_str(&self) -> Option<&str> {
        self.str_field("date")
    }

    /// Parsed `YYYY-MM-DD` date, if present and valid.
    pub fn date(&self) -> Option<NaiveDate> {
        self.date_str()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
    }

    /// File stem, used when a submission has no title.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// `@github` when a GitHub handle is set, otherwise the author name.
    pub fn author_display(&self) -> String {
        match self.github() {
            Some(handle) => format!("@{}", handle),
            None => self.author().unwrap_or("Unknown").to_string(),
        }
    }

    /// Catalog-relative path with `/` separators, for markdown links.
    pub fn link_path(&self) -> String {
        self.rel_path
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Record for duplicate detection, identified by canonical path.
    pub fn to_record(&self) -> SubmissionRecord {
        SubmissionRecord::new(
            identity_of(&self.path),
            self.title().unwrap_or_default(),
            self.content.clone(),
        )
    }
}

/// Canonical identity of a path; falls back to the path itself when it
/// cannot be resolved.
pub fn identity_of(path: &Path) -> String {
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .to_string_lossy()
        .to_string()
}

/// Split raw file text into front matter and body.
///
/// Text that does not open with a `---` line has no front matter: the
/// metadata is empty and the whole text is the body.
pub fn split_front_matter(text: &str) -> Result<(Mapping, String), LoadError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut lines = text.split_inclusive('\n');
    let opens = lines.next().map(is_delimiter).unwrap_or(false);
    if !opens {
        return Ok((Mapping::new(), text.trim().to_string()));
    }

    let mut offset = text.find('\n').map(|i| i + 1).unwrap_or(text.len());
    let yaml_start = offset;
    for line in lines {
        if is_delimiter(line) {
            let yaml = &text[yaml_start..offset];
            let body = &text[offset + line.len()..];
            return Ok((parse_metadata(yaml)?, body.trim().to_string()));
        }
        offset += line.len();
    }

    Err(LoadError::UnterminatedFrontMatter)
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end() == "---"
}

fn parse_metadata(yaml: &str) -> Result<Mapping, LoadError> {
    if yaml.trim().is_empty() {
        return Ok(Mapping::new());
    }
    match serde_yaml::from_str::<Value>(yaml)? {
        Value::Mapping(map) => Ok(map),
        Value::Null => Ok(Mapping::new()),
        other => Err(LoadError::NotAMapping(yaml_type_name(&other))),
    }
}

/// Human-readable name of a YAML value's type.
pub fn yaml_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Sequence(_) => "list",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

/// Load one submission. `catalog_root` is used to derive the relative path.
pub fn load_submission(path: &Path, catalog_root: &Path) -> Result<Submission, LoadError> {
    let text = std::fs::read_to_string(path)?;
    let (metadata, content) = split_front_matter(&text)?;

    let rel_path = path
        .strip_prefix(catalog_root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf());

    Ok(Submission {
        path: path.to_path_buf(),
        rel_path,
        metadata,
        content,
    })
}

/// Load a submission as a duplicate-detection record, or the failure the
/// batch checker reports for it.
pub fn load_record(path: &Path, catalog_root: &Path) -> Result<SubmissionRecord, LoadFailure> {
    load_submission(path, catalog_root)
        .map(|s| s.to_record())
        .map_err(|e| LoadFailure::new(identity_of(path), e.to_string()))
}

/// All submission files under the catalog, sorted by path.
///
/// A missing submissions directory is an empty catalog, not an error.
pub fn discover_submissions(config: &Config) -> Result<Vec<PathBuf>> {
    let dir = config.catalog.submissions_path();
    if !dir.exists() {
        tracing::debug!(dir = %dir.display(), "submissions directory does not exist");
        return Ok(Vec::new());
    }

    let include_set = build_globset(&config.catalog.include_globs)?;
    let exclude_set = build_globset(&config.catalog.exclude_globs)?;

    let mut paths = Vec::new();
    for entry in WalkDir::new(&dir) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(&dir).unwrap_or(path);
        let rel_str = relative.to_string_lossy().to_string();

        if exclude_set.is_match(&rel_str) || !include_set.is_match(&rel_str) {
            continue;
        }

        paths.push(path.to_path_buf());
    }

    // Sort for deterministic ordering
    paths.sort();
    Ok(paths)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

/// Every discovered submission, split into loaded and failed.
#[derive(Debug, Default)]
pub struct Catalog {
    pub submissions: Vec<Submission>,
    pub failures: Vec<(PathBuf, LoadError)>,
}

impl Catalog {
    /// Records for duplicate detection. Failed files are already excluded.
    pub fn records(&self) -> Vec<SubmissionRecord> {
        self.submissions.iter().map(Submission::to_record).collect()
    }
}

/// Load the whole catalog. Individual failures are logged and collected;
/// they never abort the scan.
pub fn load_catalog(config: &Config) -> Result<Catalog> {
    let mut catalog = Catalog::default();
    for path in discover_submissions(config)? {
        match load_submission(&path, &config.catalog.root) {
            Ok(submission) => catalog.submissions.push(submission),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to load submission");
                catalog.failures.push((path, e));
            }
        }
    }
    tracing::debug!(
        loaded = catalog.submissions.len(),
        failed = catalog.failures.len(),
        "catalog loaded"
    );
    Ok(catalog)
}
