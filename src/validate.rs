//! Submission validation.
//!
//! Checks a submission file against the catalog's conventions: file
//! naming and location, required front matter fields, required body
//! sections, and content quality (leftover template placeholders,
//! minimum length).

use anyhow::Result;
use regex::{Regex, RegexBuilder};
use serde_yaml::Value;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

use crate::config::Config;
use crate::models::{REQUIRED_FIELDS, REQUIRED_SECTIONS, SECTION_EMOJI};
use crate::submission::{discover_submissions, load_submission, yaml_type_name, Submission};

/// Template text that must be replaced before a submission is accepted.
const PLACEHOLDER_PATTERNS: [&str; 6] = [
    r"Your .+ here",
    r"e\.g\.,\s*$",
    r"TODO",
    r"FIXME",
    r"\[.*\]\(link\)",
    r"if applicable\)",
];

/// A single rule violation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("File must have .md extension, got: {0}")]
    BadExtension(String),

    #[error("Filename must be lowercase: {stem} -> {lowered}")]
    NotLowercase { stem: String, lowered: String },

    #[error("Filename must not contain spaces, use underscores: {0}")]
    ContainsSpaces(String),

    #[error("File must be in submissions/ directory")]
    NotInSubmissionsDir,

    #[error("File must be in submissions/YEAR/ subdirectory")]
    MissingYearDir,

    #[error("Year directory must be 4 digits: {0}")]
    BadYearDir(String),

    #[error("Failed to parse front matter: {0}")]
    Unparseable(String),

    #[error("Missing required front matter field: {0}")]
    MissingField(String),

    #[error("Field '{field}' must be str, got {actual}")]
    WrongFieldType { field: String, actual: &'static str },

    #[error("Invalid category: '{category}'. Valid categories: {valid}")]
    InvalidCategory { category: String, valid: String },

    #[error("Date must be in YYYY-MM-DD format, got: {0}")]
    BadDate(String),

    #[error("Missing required section: {0}")]
    MissingSection(String),

    #[error("Content contains placeholder text matching pattern: {0}")]
    Placeholder(String),

    #[error(
        "Content too short ({actual} chars). Minimum {minimum} characters required for a meaningful submission."
    )]
    ContentTooShort { actual: usize, minimum: usize },
}

/// All violations found in one file.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub path: PathBuf,
    pub errors: Vec<ValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Compiled validation rules.
pub struct Validator {
    categories: Vec<String>,
    min_content_chars: usize,
    header: Regex,
    date: Regex,
    year_dir: Regex,
    placeholders: Vec<(&'static str, Regex)>,
}

impl Validator {
    pub fn new(config: &Config) -> Result<Self> {
        let placeholders = PLACEHOLDER_PATTERNS
            .iter()
            .map(|p| {
                RegexBuilder::new(p)
                    .case_insensitive(true)
                    .build()
                    .map(|re| (*p, re))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            categories: config.validation.categories.clone(),
            min_content_chars: config.validation.min_content_chars,
            header: Regex::new(r"(?m)^#{1,6}\s+(.+)$")?,
            date: Regex::new(r"^\d{4}-\d{2}-\d{2}$")?,
            year_dir: Regex::new(r"^\d{4}$")?,
            placeholders,
        })
    }

    /// Validate one file. A missing file yields a single
    /// [`ValidationError::FileNotFound`]; unparseable front matter stops
    /// after the filename checks.
    pub fn validate_file(&self, path: &Path) -> ValidationReport {
        let mut errors = Vec::new();

        if !path.exists() {
            errors.push(ValidationError::FileNotFound(path.display().to_string()));
            return ValidationReport {
                path: path.to_path_buf(),
                errors,
            };
        }

        errors.extend(self.check_filename(path));

        // Relative paths are only needed by the index; any root works here.
        match load_submission(path, Path::new("")) {
            Ok(submission) => {
                errors.extend(self.check_front_matter(&submission));
                errors.extend(self.check_sections(&submission.content));
                errors.extend(self.check_content_quality(&submission.content));
            }
            Err(e) => errors.push(ValidationError::Unparseable(e.to_string())),
        }

        ValidationReport {
            path: path.to_path_buf(),
            errors,
        }
    }

    /// Naming and location rules: `.md`, lowercase, no spaces, and
    /// stored under `submissions/<YYYY>/`.
    pub fn check_filename(&self, path: &Path) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        let extension = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        if extension.to_lowercase() != ".md" {
            errors.push(ValidationError::BadExtension(extension));
        }

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let lowered = stem.to_lowercase();
        if stem != lowered {
            errors.push(ValidationError::NotLowercase {
                stem: stem.clone(),
                lowered,
            });
        }
        if stem.contains(' ') {
            errors.push(ValidationError::ContainsSpaces(stem));
        }

        let parts: Vec<String> = path
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().to_string()),
                _ => None,
            })
            .collect();
        match parts.iter().position(|p| p == "submissions") {
            None => errors.push(ValidationError::NotInSubmissionsDir),
            Some(idx) => match parts.get(idx + 1) {
                None => errors.push(ValidationError::MissingYearDir),
                Some(year) if !self.year_dir.is_match(year) => {
                    errors.push(ValidationError::BadYearDir(year.clone()))
                }
                Some(_) => {}
            },
        }

        errors
    }

    pub fn check_front_matter(&self, submission: &Submission) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        for field in REQUIRED_FIELDS {
            match submission.metadata.get(field) {
                None => errors.push(ValidationError::MissingField(field.to_string())),
                Some(Value::String(_)) => {}
                Some(other) => errors.push(ValidationError::WrongFieldType {
                    field: field.to_string(),
                    actual: yaml_type_name(other),
                }),
            }
        }

        if let Some(category) = submission.category() {
            if !self.categories.iter().any(|c| c == category) {
                errors.push(ValidationError::InvalidCategory {
                    category: category.to_string(),
                    valid: self.categories.join(", "),
                });
            }
        }

        if let Some(date) = submission.date_str() {
            if !self.date.is_match(date) {
                errors.push(ValidationError::BadDate(date.to_string()));
            }
        }

        errors
    }

    /// Every required section must appear in some header, ignoring case
    /// and the template's emoji.
    pub fn check_sections(&self, content: &str) -> Vec<ValidationError> {
        let headers: Vec<String> = self
            .header
            .captures_iter(content)
            .filter_map(|cap| cap.get(1))
            .map(|m| {
                m.as_str()
                    .chars()
                    .filter(|c| !SECTION_EMOJI.contains(c))
                    .collect::<String>()
                    .trim()
                    .to_lowercase()
            })
            .collect();

        REQUIRED_SECTIONS
            .iter()
            .filter(|section| {
                let needle = section.to_lowercase();
                !headers.iter().any(|h| h.contains(&needle))
            })
            .map(|section| ValidationError::MissingSection(section.to_string()))
            .collect()
    }

    pub fn check_content_quality(&self, content: &str) -> Vec<ValidationError> {
        let mut errors: Vec<ValidationError> = self
            .placeholders
            .iter()
            .filter(|(_, re)| re.is_match(content))
            .map(|(pattern, _)| ValidationError::Placeholder(pattern.to_string()))
            .collect();

        let actual = content.trim().chars().count();
        if actual < self.min_content_chars {
            errors.push(ValidationError::ContentTooShort {
                actual,
                minimum: self.min_content_chars,
            });
        }

        errors
    }
}

/// Validate a single submission with the rules from `config`.
pub fn validate_submission(path: &Path, config: &Config) -> Result<ValidationReport> {
    Ok(Validator::new(config)?.validate_file(path))
}

/// Validate the given files (or every submission when none are given),
/// print a report, and return whether all files are valid.
pub fn run_validate(config: &Config, files: &[PathBuf]) -> Result<bool> {
    let files = if files.is_empty() {
        discover_submissions(config)?
    } else {
        files.to_vec()
    };

    if files.is_empty() {
        println!("No submission files to validate.");
        return Ok(true);
    }

    let validator = Validator::new(config)?;
    println!("Validating {} submission(s)...", files.len());
    println!();

    let mut all_valid = true;
    for path in &files {
        let report = validator.validate_file(path);
        println!("{}", display_name(path));

        if report.is_valid() {
            println!("   valid");
        } else {
            all_valid = false;
            tracing::debug!(path = %path.display(), errors = report.errors.len(), "invalid submission");
            println!("   invalid - {} error(s):", report.errors.len());
            for error in &report.errors {
                println!("      - {}", error);
            }
        }
        println!();
    }

    println!("{}", "=".repeat(60));
    if all_valid {
        println!("All submissions are valid.");
    } else {
        println!("Some submissions have errors. Please fix them and try again.");
    }

    Ok(all_valid)
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const VALID_BODY: &str = "\
## 📝 Description
We tried to fine-tune a large vision transformer on a small medical imaging dataset.

## 🤖 Model / Algorithm
ViT-B/16 pretrained on ImageNet-21k, trained with AdamW and cosine decay.

## 📊 Dataset
Four thousand chest X-rays with noisy labels from two hospitals.

## ❌ What Failed
Validation accuracy peaked after two epochs and then steadily declined.

## 🔍 Why It Failed
The model memorized hospital-specific artifacts instead of pathology.

## 📈 Logs / Metrics
Train accuracy 99.8 percent, validation accuracy 61.2 percent at epoch twenty.

## 💡 Lessons Learned
Check for site leakage before scaling up the model.
";

    fn write_submission(root: &Path, rel: &str, front: &str, body: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, format!("---\n{}---\n\n{}", front, body)).unwrap();
        path
    }

    fn valid_front() -> &'static str {
        "title: ViT overfit on X-rays\ncategory: Computer Vision\ndate: \"2024-02-11\"\nauthor: Grace\ngithub: grace\n"
    }

    fn validator() -> Validator {
        Validator::new(&Config::default()).unwrap()
    }

    #[test]
    fn test_valid_submission() {
        let tmp = TempDir::new().unwrap();
        let path = write_submission(
            tmp.path(),
            "submissions/2024/vit_overfit.md",
            valid_front(),
            VALID_BODY,
        );
        let report = validator().validate_file(&path);
        assert!(report.is_valid(), "{:?}", report.errors);
    }

    #[test]
    fn test_validate_submission_uses_config() {
        let tmp = TempDir::new().unwrap();
        let path = write_submission(
            tmp.path(),
            "submissions/2024/vit_overfit.md",
            valid_front(),
            VALID_BODY,
        );
        let mut config = Config::default();
        config.validation.min_content_chars = 5000;
        config.validation.categories = vec!["Other".to_string()];

        let report = validate_submission(&path, &config).unwrap();
        assert_eq!(report.errors.len(), 2);
        assert!(matches!(report.errors[0], ValidationError::InvalidCategory { .. }));
        assert!(matches!(
            report.errors[1],
            ValidationError::ContentTooShort { minimum: 5000, .. }
        ));
    }

    #[test]
    fn test_missing_file() {
        let report = validator().validate_file(Path::new("/no/such/submissions/2024/x.md"));
        assert_eq!(report.errors.len(), 1);
        assert!(matches!(report.errors[0], ValidationError::FileNotFound(_)));
    }

    #[test]
    fn test_filename_rules() {
        let v = validator();
        assert!(v
            .check_filename(Path::new("repo/submissions/2024/good_name.md"))
            .is_empty());

        let errors = v.check_filename(Path::new("repo/submissions/2024/Bad Name.txt"));
        assert_eq!(
            errors,
            vec![
                ValidationError::BadExtension(".txt".to_string()),
                ValidationError::NotLowercase {
                    stem: "Bad Name".to_string(),
                    lowered: "bad name".to_string()
                },
                ValidationError::ContainsSpaces("Bad Name".to_string()),
            ]
        );

        assert_eq!(
            v.check_filename(Path::new("notes/x.md")),
            vec![ValidationError::NotInSubmissionsDir]
        );
        assert_eq!(
            v.check_filename(Path::new("submissions/x.md")),
            vec![ValidationError::BadYearDir("x.md".to_string())]
        );
        assert_eq!(
            v.check_filename(Path::new("submissions/24/x.md")),
            vec![ValidationError::BadYearDir("24".to_string())]
        );
    }

    #[test]
    fn test_uppercase_extension_is_accepted() {
        assert!(validator()
            .check_filename(Path::new("submissions/2024/x.MD"))
            .is_empty());
    }

    #[test]
    fn test_front_matter_rules() {
        let tmp = TempDir::new().unwrap();
        let path = write_submission(
            tmp.path(),
            "submissions/2024/x.md",
            "title: 42\ncategory: Astrology\ndate: \"11/02/2024\"\nauthor: Grace\n",
            VALID_BODY,
        );
        let report = validator().validate_file(&path);
        let messages: Vec<String> = report.errors.iter().map(|e| e.to_string()).collect();
        assert!(messages.contains(&"Missing required front matter field: github".to_string()));
        assert!(messages.contains(&"Field 'title' must be str, got int".to_string()));
        assert!(messages
            .iter()
            .any(|m| m.starts_with("Invalid category: 'Astrology'.")));
        assert!(messages.contains(&"Date must be in YYYY-MM-DD format, got: 11/02/2024".to_string()));
    }

    #[test]
    fn test_missing_sections() {
        let errors = validator().check_sections("## Description\ntext\n### dataset\n## 💡 Lessons learned\n");
        let missing: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        assert_eq!(
            missing,
            vec![
                "Missing required section: Model / Algorithm",
                "Missing required section: What Failed",
                "Missing required section: Why It Failed",
                "Missing required section: Logs / Metrics",
            ]
        );
    }

    #[test]
    fn test_placeholders_and_length() {
        let v = validator();
        let errors = v.check_content_quality("Your description here. TODO: fill in [paper](link)");
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        assert!(messages.contains(&r"Content contains placeholder text matching pattern: Your .+ here".to_string()));
        assert!(messages.contains(&"Content contains placeholder text matching pattern: TODO".to_string()));
        assert!(messages.contains(&r"Content contains placeholder text matching pattern: \[.*\]\(link\)".to_string()));
        assert!(matches!(
            errors.last(),
            Some(ValidationError::ContentTooShort { minimum: 500, .. })
        ));
    }

    #[test]
    fn test_placeholders_are_case_insensitive() {
        let errors = validator().check_content_quality(&format!("{} fixme", "x".repeat(600)));
        assert_eq!(errors, vec![ValidationError::Placeholder("FIXME".to_string())]);
    }

    #[test]
    fn test_unparseable_front_matter() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("submissions/2024/Broken.md");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "---\ntitle: [\n---\nbody").unwrap();

        let report = validator().validate_file(&path);
        assert_eq!(report.errors.len(), 2);
        assert!(matches!(report.errors[0], ValidationError::NotLowercase { .. }));
        assert!(matches!(report.errors[1], ValidationError::Unparseable(_)));
    }
}
