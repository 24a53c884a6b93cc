//! README index regeneration.
//!
//! Rebuilds the category listing and the recent-submissions list inside
//! the README, replacing only the text between the auto-generated
//! markers.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use std::cmp::Reverse;

use crate::config::Config;
use crate::models::{category_emoji, is_known_category, CATEGORIES, OTHER_CATEGORY};
use crate::submission::{load_catalog, Submission};

pub const CATEGORIES_START: &str = "<!-- AUTO-GENERATED CATEGORIES START -->";
pub const CATEGORIES_END: &str = "<!-- AUTO-GENERATED CATEGORIES END -->";
pub const RECENT_START: &str = "<!-- AUTO-GENERATED RECENT START -->";
pub const RECENT_END: &str = "<!-- AUTO-GENERATED RECENT END -->";

const NO_SUBMISSIONS: &str = "_No submissions yet. Be the first to share your failure!_";

/// One README line's worth of submission metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub title: String,
    pub category: String,
    pub author: String,
    pub github: Option<String>,
    pub date_str: String,
    pub date: Option<NaiveDate>,
    pub link: String,
}

impl IndexEntry {
    pub fn from_submission(submission: &Submission) -> Self {
        Self {
            title: submission
                .title()
                .map(str::to_string)
                .unwrap_or_else(|| submission.stem()),
            category: submission.category().unwrap_or(OTHER_CATEGORY).to_string(),
            author: submission.author().unwrap_or("Unknown").to_string(),
            github: submission.github().map(str::to_string),
            date_str: submission.date_str().unwrap_or_default().to_string(),
            date: submission.date(),
            link: submission.link_path(),
        }
    }

    fn author_display(&self) -> String {
        match &self.github {
            Some(handle) => format!("@{}", handle),
            None => self.author.clone(),
        }
    }

    /// Category used for grouping; unknown categories fall under "Other".
    fn group(&self) -> &str {
        if is_known_category(&self.category) {
            &self.category
        } else {
            OTHER_CATEGORY
        }
    }
}

/// Entries for every loadable submission, newest first. Entries without
/// a valid date sort last; ties keep discovery order.
pub fn collect_entries(submissions: &[Submission]) -> Vec<IndexEntry> {
    let mut entries: Vec<IndexEntry> = submissions.iter().map(IndexEntry::from_submission).collect();
    entries.sort_by_key(|e| Reverse(e.date));
    entries
}

pub fn render_categories(entries: &[IndexEntry]) -> String {
    let mut lines = Vec::new();

    for (category, emoji) in CATEGORIES {
        lines.push(format!("### {} {}", emoji, category));

        let mut any = false;
        for entry in entries.iter().filter(|e| e.group() == category) {
            any = true;
            lines.push(format!(
                "- [{}]({}) by {} ({})",
                entry.title,
                entry.link,
                entry.author_display(),
                entry.date_str
            ));
        }
        if !any {
            lines.push("_No submissions yet in this category._".to_string());
        }

        lines.push(String::new());
    }

    lines.join("\n").trim_end().to_string()
}

pub fn render_recent(entries: &[IndexEntry], limit: usize) -> String {
    if entries.is_empty() {
        return NO_SUBMISSIONS.to_string();
    }

    entries
        .iter()
        .take(limit)
        .map(|entry| {
            format!(
                "- {} [{}]({}) by {} ({})",
                category_emoji(&entry.category),
                entry.title,
                entry.link,
                entry.author_display(),
                entry.date_str
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Replace the text between `start` and `end`. When either marker is
/// missing the content is returned unchanged.
pub fn replace_section(content: &str, start: &str, end: &str, body: &str) -> String {
    let (Some(start_idx), Some(end_idx)) = (content.find(start), content.find(end)) else {
        tracing::warn!(marker = start, "markers not found in README");
        return content.to_string();
    };

    let before = &content[..start_idx + start.len()];
    let after = &content[end_idx..];
    format!("{}\n{}\n{}", before, body, after)
}

/// Regenerate both README sections from the catalog. Returns the number
/// of submissions indexed.
pub fn update_readme(config: &Config) -> Result<usize> {
    let readme = config.catalog.readme_path();
    if !readme.exists() {
        bail!("README not found: {}", readme.display());
    }

    let content = std::fs::read_to_string(&readme)
        .with_context(|| format!("Failed to read {}", readme.display()))?;

    let catalog = load_catalog(config)?;
    let entries = collect_entries(&catalog.submissions);

    let content = replace_section(
        &content,
        CATEGORIES_START,
        CATEGORIES_END,
        &render_categories(&entries),
    );
    let content = replace_section(
        &content,
        RECENT_START,
        RECENT_END,
        &render_recent(&entries, config.index.num_recent),
    );

    std::fs::write(&readme, content)
        .with_context(|| format!("Failed to write {}", readme.display()))?;

    tracing::info!(submissions = entries.len(), readme = %readme.display(), "README updated");
    Ok(entries.len())
}

pub fn run_index(config: &Config) -> Result<()> {
    let count = update_readme(config)?;
    println!("Found {} submission(s)", count);
    println!("README updated: {}", config.catalog.readme_path().display());
    Ok(())
}
