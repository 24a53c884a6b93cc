//! Weekly digest generation.
//!
//! Summarises the catalog into `WEEKLY_SUMMARY.md`: submissions from the
//! recent window, overall statistics, per-category counts, recurring
//! failure patterns and the most active contributors. The reference time
//! is passed in so output is reproducible.

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDateTime, NaiveTime};
use std::collections::{BTreeMap, HashSet};

use crate::config::Config;
use crate::models::{category_emoji, CATEGORIES, OTHER_CATEGORY};
use crate::submission::{load_catalog, Submission};

/// Failure pattern families and the keywords that indicate them, in
/// reporting order for ties.
pub const FAILURE_KEYWORDS: [(&str, &[&str]); 10] = [
    ("overfitting", &["overfit", "overfitting", "memoriz"]),
    ("underfitting", &["underfit", "underfitting", "high bias"]),
    (
        "data quality",
        &["data quality", "noisy data", "mislabeled", "annotation"],
    ),
    (
        "small dataset",
        &["small dataset", "limited data", "few samples", "data scarcity"],
    ),
    (
        "hyperparameters",
        &["hyperparameter", "learning rate", "batch size", "tuning"],
    ),
    (
        "architecture",
        &["architecture", "model size", "layers", "capacity"],
    ),
    (
        "training instability",
        &["nan", "exploding gradient", "vanishing gradient", "unstable"],
    ),
    (
        "computational resources",
        &["memory", "gpu", "oom", "out of memory", "resource"],
    ),
    (
        "preprocessing",
        &["preprocessing", "normalization", "tokenization", "augmentation"],
    ),
    (
        "evaluation",
        &["metric", "evaluation", "test set", "validation", "leakage"],
    ),
];

/// Start of the digest window, `now - window_days`.
///
/// Fails when the window reaches past the range of representable dates.
pub fn window_start(now: NaiveDateTime, window_days: i64) -> Result<NaiveDateTime> {
    Duration::try_days(window_days)
        .and_then(|window| now.checked_sub_signed(window))
        .with_context(|| format!("Digest window of {} day(s) is out of range", window_days))
}

/// Submissions dated on or after `now - window_days`. Undated
/// submissions are never recent.
pub fn recent_submissions(
    submissions: &[Submission],
    now: NaiveDateTime,
    window_days: i64,
) -> Result<Vec<&Submission>> {
    let cutoff = window_start(now, window_days)?;
    Ok(submissions
        .iter()
        .filter(|s| {
            s.date()
                .map(|d| d.and_time(NaiveTime::MIN) >= cutoff)
                .unwrap_or(false)
        })
        .collect())
}

/// Pattern families found in the submissions, each counted at most once
/// per submission, most frequent first. Ties keep the order in which the
/// patterns were first seen.
pub fn detect_failure_patterns(submissions: &[Submission]) -> Vec<(&'static str, usize)> {
    let mut counts: Vec<(&'static str, usize)> = Vec::new();

    for submission in submissions {
        let content = submission.content.to_lowercase();
        for (pattern, keywords) in FAILURE_KEYWORDS {
            if !keywords.iter().any(|k| content.contains(k)) {
                continue;
            }
            match counts.iter_mut().find(|(name, _)| *name == pattern) {
                Some((_, count)) => *count += 1,
                None => counts.push((pattern, 1)),
            }
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// Submission count per declared category (missing means "Other").
pub fn category_distribution(submissions: &[Submission]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for submission in submissions {
        let category = submission.category().unwrap_or(OTHER_CATEGORY).to_string();
        *counts.entry(category).or_insert(0) += 1;
    }
    counts
}

fn contributor_key(submission: &Submission) -> String {
    submission
        .github()
        .or(submission.author())
        .unwrap_or("Unknown")
        .to_string()
}

/// The `limit` most prolific contributors (GitHub handle, else author
/// name). Ties keep first-seen order.
pub fn top_contributors(submissions: &[Submission], limit: usize) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for submission in submissions {
        let key = contributor_key(submission);
        match counts.iter_mut().find(|(name, _)| *name == key) {
            Some((_, count)) => *count += 1,
            None => counts.push((key, 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(limit);
    counts
}

/// Capitalise the first letter of every word, lowercase the rest.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

/// Render the digest markdown.
pub fn render_digest(
    all: &[Submission],
    recent: &[&Submission],
    config: &Config,
    now: NaiveDateTime,
) -> Result<String> {
    let start = window_start(now, config.digest.window_days)?;
    let mut lines: Vec<String> = vec![
        "# Weekly Summary 📊".to_string(),
        String::new(),
        "> Auto-generated summary of new failures and common patterns.".to_string(),
        String::new(),
        "---".to_string(),
        String::new(),
        "## 📅 Latest Summary".to_string(),
        String::new(),
        format!(
            "**Week of {} - {}**",
            start.format("%B %d"),
            now.format("%B %d, %Y")
        ),
        String::new(),
    ];

    if recent.is_empty() {
        lines.extend([
            "### 🆕 New Submissions".to_string(),
            String::new(),
            "_No new submissions this week._".to_string(),
            String::new(),
        ]);
    } else {
        lines.push(format!("### 🆕 New Submissions ({})", recent.len()));
        lines.push(String::new());
        for submission in recent {
            lines.push(format!(
                "- {} [{}]({}) by {}",
                category_emoji(submission.category().unwrap_or(OTHER_CATEGORY)),
                submission
                    .title()
                    .map(str::to_string)
                    .unwrap_or_else(|| submission.stem()),
                submission.link_path(),
                submission.author_display()
            ));
        }
        lines.push(String::new());
    }

    let contributors: HashSet<String> = all.iter().map(contributor_key).collect();
    lines.extend([
        "---".to_string(),
        String::new(),
        "## 📈 Statistics".to_string(),
        String::new(),
        "| Metric | Value |".to_string(),
        "|--------|-------|".to_string(),
        format!("| Total Submissions | {} |", all.len()),
        format!("| This Week | {} |", recent.len()),
        format!("| Categories | {} |", CATEGORIES.len()),
        format!("| Contributors | {} |", contributors.len()),
        String::new(),
    ]);

    if !all.is_empty() {
        lines.extend([
            "### 📊 By Category".to_string(),
            String::new(),
            "| Category | Count |".to_string(),
            "|----------|-------|".to_string(),
        ]);
        let distribution = category_distribution(all);
        for (category, emoji) in CATEGORIES {
            let count = distribution.get(category).copied().unwrap_or(0);
            lines.push(format!("| {} {} | {} |", emoji, category, count));
        }
        lines.push(String::new());
    }

    lines.extend([
        "---".to_string(),
        String::new(),
        "## 🏷️ Common Failure Patterns".to_string(),
        String::new(),
    ]);
    if all.is_empty() {
        lines.push("_Patterns will be identified once we have more submissions._".to_string());
    } else {
        let patterns = detect_failure_patterns(all);
        if patterns.is_empty() {
            lines.push("_No clear patterns detected yet._".to_string());
        } else {
            lines.push("| Pattern | Occurrences |".to_string());
            lines.push("|---------|-------------|".to_string());
            for (pattern, count) in patterns.iter().take(config.digest.max_patterns) {
                lines.push(format!("| {} | {} |", title_case(pattern), count));
            }
        }
    }
    lines.push(String::new());

    if !all.is_empty() {
        lines.extend([
            "---".to_string(),
            String::new(),
            "## 🏆 Top Contributors".to_string(),
            String::new(),
            "| Contributor | Submissions |".to_string(),
            "|-------------|-------------|".to_string(),
        ]);
        for (name, count) in top_contributors(all, config.digest.top_contributors) {
            let display = if name.starts_with('@') {
                name
            } else {
                format!("@{}", name)
            };
            lines.push(format!("| {} | {} |", display, count));
        }
        lines.push(String::new());
    }

    lines.extend([
        "---".to_string(),
        String::new(),
        "## 📚 Archive".to_string(),
        String::new(),
        "Previous weekly summaries will be listed here.".to_string(),
        String::new(),
        "---".to_string(),
        String::new(),
        "<p align=\"center\">".to_string(),
        "  <i>Generated automatically every Sunday at 03:00 UTC</i>".to_string(),
        "</p>".to_string(),
    ]);

    Ok(lines.join("\n"))
}

/// Counts reported after writing a digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigestSummary {
    pub total: usize,
    pub recent: usize,
}

/// Build the digest for `now` and write it to the configured summary file.
pub fn write_digest(config: &Config, now: NaiveDateTime) -> Result<DigestSummary> {
    let catalog = load_catalog(config)?;
    let recent = recent_submissions(&catalog.submissions, now, config.digest.window_days)?;
    let content = render_digest(&catalog.submissions, &recent, config, now)?;

    let path = config.catalog.summary_path();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    std::fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;

    tracing::info!(
        total = catalog.submissions.len(),
        recent = recent.len(),
        path = %path.display(),
        "digest written"
    );
    Ok(DigestSummary {
        total: catalog.submissions.len(),
        recent: recent.len(),
    })
}

pub fn run_digest(config: &Config) -> Result<()> {
    let now = chrono::Local::now().naive_local();
    let summary = write_digest(config, now)?;
    println!("Found {} total submission(s)", summary.total);
    println!(
        "Found {} submission(s) from the past {} day(s)",
        summary.recent, config.digest.window_days
    );
    println!("Digest written: {}", config.catalog.summary_path().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 10)
            .unwrap()
            .and_hms_opt(3, 0, 0)
            .unwrap()
    }

    fn write(root: &Path, name: &str, front: &str, body: &str) {
        let dir = root.join("submissions/2024");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(name), format!("---\n{}---\n{}", front, body)).unwrap();
    }

    fn catalog_config(root: &Path) -> Config {
        let mut config = Config::default();
        config.catalog.root = root.to_path_buf();
        config
    }

    fn seeded() -> (TempDir, Config) {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            "a.md",
            "title: Old overfit\ncategory: Computer Vision\ndate: '2024-01-05'\nauthor: Ada\ngithub: ada\n",
            "The model would overfit after epoch 3 and GPU memory ran out.",
        );
        write(
            tmp.path(),
            "b.md",
            "title: Fresh leak\ncategory: Tabular Data\ndate: '2024-03-04'\nauthor: Bo\n",
            "Target leakage in the validation split; the learning rate was fine.",
        );
        write(
            tmp.path(),
            "c.md",
            "title: Boundary day\ncategory: Astrology\ndate: '2024-03-03'\nauthor: Ada\ngithub: ada\n",
            "Memorized the training set. Overfitting everywhere.",
        );
        let config = catalog_config(tmp.path());
        (tmp, config)
    }

    #[test]
    fn test_recent_window_is_inclusive_of_cutoff_day() {
        let (_tmp, config) = seeded();
        let catalog = load_catalog(&config).unwrap();

        // Cutoff is 2024-03-03 03:00; a date compares as midnight.
        let recent = recent_submissions(&catalog.submissions, now(), 7).unwrap();
        let titles: Vec<&str> = recent.iter().filter_map(|s| s.title()).collect();
        assert_eq!(titles, vec!["Fresh leak"]);

        let recent = recent_submissions(&catalog.submissions, now(), 8).unwrap();
        assert_eq!(recent.len(), 2);
    }

    #[test]
    fn test_failure_patterns() {
        let (_tmp, config) = seeded();
        let catalog = load_catalog(&config).unwrap();
        let patterns = detect_failure_patterns(&catalog.submissions);
        assert_eq!(
            patterns,
            vec![
                ("overfitting", 2),
                ("computational resources", 1),
                ("hyperparameters", 1),
                ("evaluation", 1),
            ]
        );
    }

    #[test]
    fn test_top_contributors() {
        let (_tmp, config) = seeded();
        let catalog = load_catalog(&config).unwrap();
        assert_eq!(
            top_contributors(&catalog.submissions, 5),
            vec![("ada".to_string(), 2), ("Bo".to_string(), 1)]
        );
        assert_eq!(top_contributors(&catalog.submissions, 1).len(), 1);
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("computational resources"), "Computational Resources");
        assert_eq!(title_case("overfitting"), "Overfitting");
    }

    #[test]
    fn test_render_digest() {
        let (_tmp, config) = seeded();
        let catalog = load_catalog(&config).unwrap();
        let recent = recent_submissions(&catalog.submissions, now(), 7).unwrap();
        let out = render_digest(&catalog.submissions, &recent, &config, now()).unwrap();

        assert!(out.contains("**Week of March 03 - March 10, 2024**"));
        assert!(out.contains("### 🆕 New Submissions (1)"));
        assert!(out.contains("- 📊 [Fresh leak](submissions/2024/b.md) by Bo"));
        assert!(out.contains("| Total Submissions | 3 |"));
        assert!(out.contains("| This Week | 1 |"));
        assert!(out.contains("| Categories | 11 |"));
        assert!(out.contains("| Contributors | 2 |"));
        assert!(out.contains("| 🖼️ Computer Vision | 1 |"));
        assert!(out.contains("| 🤖 Other | 0 |"));
        assert!(out.contains("| Overfitting | 2 |"));
        assert!(out.contains("| @ada | 2 |"));
        assert!(out.contains("| @Bo | 1 |"));
        assert!(out.ends_with("</p>"));
    }

    #[test]
    fn test_max_patterns_cap() {
        let (_tmp, mut config) = seeded();
        config.digest.max_patterns = 1;
        let catalog = load_catalog(&config).unwrap();
        let out = render_digest(&catalog.submissions, &[], &config, now()).unwrap();
        assert!(out.contains("| Overfitting | 2 |"));
        assert!(!out.contains("| Evaluation |"));
        assert!(out.contains("_No new submissions this week._"));
    }

    #[test]
    fn test_empty_catalog() {
        let tmp = TempDir::new().unwrap();
        let config = catalog_config(tmp.path());
        let out = render_digest(&[], &[], &config, now()).unwrap();
        assert!(out.contains("_Patterns will be identified once we have more submissions._"));
        assert!(!out.contains("Top Contributors"));
        assert!(!out.contains("By Category"));
    }

    #[test]
    fn test_write_digest() {
        let (tmp, config) = seeded();
        let summary = write_digest(&config, now()).unwrap();
        assert_eq!(summary, DigestSummary { total: 3, recent: 1 });
        let written = fs::read_to_string(tmp.path().join("WEEKLY_SUMMARY.md")).unwrap();
        assert!(written.starts_with("# Weekly Summary 📊"));
    }

    #[test]
    fn test_oversized_window_is_error() {
        let (tmp, mut config) = seeded();
        config.digest.window_days = 100_000_000;
        crate::config::validate_config(&config).unwrap();

        let err = recent_submissions(&[], now(), config.digest.window_days).unwrap_err();
        assert!(err.to_string().contains("out of range"), "{}", err);
        assert!(render_digest(&[], &[], &config, now()).is_err());
        assert!(write_digest(&config, now()).is_err());
        assert!(!tmp.path().join("WEEKLY_SUMMARY.md").exists());

        assert!(window_start(now(), i64::MAX).is_err());
        assert_eq!(
            window_start(now(), 7).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 3)
                .unwrap()
                .and_hms_opt(3, 0, 0)
                .unwrap()
        );
    }
}
