use anyhow::{Context, Result};
use regex::RegexBuilder;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub use failbook_core::DedupConfig;

use crate::models::CATEGORIES;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub dedup: DedupConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub links: LinksConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub digest: DigestConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    #[serde(default = "default_root")]
    pub root: PathBuf,
    #[serde(default = "default_submissions_dir")]
    pub submissions_dir: PathBuf,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default = "default_readme")]
    pub readme: PathBuf,
    #[serde(default = "default_summary")]
    pub summary: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            submissions_dir: default_submissions_dir(),
            include_globs: default_include_globs(),
            exclude_globs: Vec::new(),
            readme: default_readme(),
            summary: default_summary(),
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}
fn default_submissions_dir() -> PathBuf {
    PathBuf::from("submissions")
}
fn default_include_globs() -> Vec<String> {
    vec!["**/*.md".to_string()]
}
fn default_readme() -> PathBuf {
    PathBuf::from("README.md")
}
fn default_summary() -> PathBuf {
    PathBuf::from("WEEKLY_SUMMARY.md")
}

impl CatalogConfig {
    pub fn submissions_path(&self) -> PathBuf {
        self.root.join(&self.submissions_dir)
    }

    pub fn readme_path(&self) -> PathBuf {
        self.root.join(&self.readme)
    }

    pub fn summary_path(&self) -> PathBuf {
        self.root.join(&self.summary)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ValidationConfig {
    #[serde(default = "default_min_content_chars")]
    pub min_content_chars: usize,
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_content_chars: default_min_content_chars(),
            categories: default_categories(),
        }
    }
}

fn default_min_content_chars() -> usize {
    500
}
fn default_categories() -> Vec<String> {
    CATEGORIES.iter().map(|(name, _)| name.to_string()).collect()
}

#[derive(Debug, Deserialize, Clone)]
pub struct LinksConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_skip_patterns")]
    pub skip_patterns: Vec<String>,
    #[serde(default = "default_warn_domains")]
    pub warn_domains: Vec<String>,
    #[serde(default = "default_trusted_domains")]
    pub trusted_domains: Vec<String>,
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_concurrent: default_max_concurrent(),
            user_agent: default_user_agent(),
            skip_patterns: default_skip_patterns(),
            warn_domains: default_warn_domains(),
            trusted_domains: default_trusted_domains(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    10
}
fn default_max_concurrent() -> usize {
    5
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (compatible; AwesomeFailedMLBot/1.0; \
     +https://github.com/ambicuity/awesome-failed-ml-experiments)"
        .to_string()
}
fn default_skip_patterns() -> Vec<String> {
    [
        r"^mailto:",
        r"^tel:",
        r"^#",
        r"localhost",
        r"127\.0\.0\.1",
        r"example\.com",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
fn default_warn_domains() -> Vec<String> {
    [
        "twitter.com",
        "x.com",
        "linkedin.com",
        "facebook.com",
        "instagram.com",
        "arxiv.org",
        "github.com",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
fn default_trusted_domains() -> Vec<String> {
    [
        "arxiv.org",
        "doi.org",
        "dl.acm.org",
        "papers.nips.cc",
        "openreview.net",
        "aclanthology.org",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    #[serde(default = "default_num_recent")]
    pub num_recent: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            num_recent: default_num_recent(),
        }
    }
}

fn default_num_recent() -> usize {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct DigestConfig {
    #[serde(default = "default_window_days")]
    pub window_days: i64,
    #[serde(default = "default_top_contributors")]
    pub top_contributors: usize,
    #[serde(default = "default_max_patterns")]
    pub max_patterns: usize,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
            top_contributors: default_top_contributors(),
            max_patterns: default_max_patterns(),
        }
    }
}

fn default_window_days() -> i64 {
    7
}
fn default_top_contributors() -> usize {
    5
}
fn default_max_patterns() -> usize {
    10
}

/// Read and validate a config file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate_config(&config)?;
    Ok(config)
}

/// Like [`load_config`], but a missing file yields the built-in defaults.
///
/// Used for the default `--config` location so a bare catalog checkout
/// works without any configuration.
pub fn load_config_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        Ok(Config::default())
    }
}

pub fn validate_config(config: &Config) -> Result<()> {
    // Validate dedup
    if !(0.0..=1.0).contains(&config.dedup.title_threshold) {
        anyhow::bail!("dedup.title_threshold must be in [0.0, 1.0]");
    }
    if !(0.0..=1.0).contains(&config.dedup.content_threshold) {
        anyhow::bail!("dedup.content_threshold must be in [0.0, 1.0]");
    }

    // Validate links
    if config.links.max_concurrent == 0 {
        anyhow::bail!("links.max_concurrent must be >= 1");
    }
    if config.links.timeout_secs == 0 {
        anyhow::bail!("links.timeout_secs must be >= 1");
    }
    for pattern in &config.links.skip_patterns {
        RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .with_context(|| format!("Invalid links.skip_patterns entry: '{}'", pattern))?;
    }

    // Validate digest
    if config.digest.window_days < 1 {
        anyhow::bail!("digest.window_days must be >= 1");
    }

    if config.validation.categories.is_empty() {
        anyhow::bail!("validation.categories must not be empty");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.dedup, DedupConfig::default());
        assert_eq!(config.catalog.submissions_dir, PathBuf::from("submissions"));
        assert_eq!(config.validation.min_content_chars, 500);
        assert_eq!(config.validation.categories.len(), 11);
        assert_eq!(config.links.max_concurrent, 5);
        assert_eq!(config.index.num_recent, 10);
        assert_eq!(config.digest.window_days, 7);
        validate_config(&config).unwrap();
    }

    #[test]
    fn test_example_config_matches_defaults() {
        let config: Config = toml::from_str(include_str!("../config/failbook.example.toml")).unwrap();
        validate_config(&config).unwrap();
        assert_eq!(config.dedup, DedupConfig::default());
        assert_eq!(config.links.skip_patterns, default_skip_patterns());
        assert_eq!(config.links.trusted_domains, default_trusted_domains());
        assert_eq!(config.digest.max_patterns, 10);
    }

    #[test]
    fn test_partial_dedup_section() {
        let config: Config = toml::from_str("[dedup]\ntitle_threshold = 0.9\n").unwrap();
        assert_eq!(config.dedup.title_threshold, 0.9);
        assert_eq!(config.dedup.content_threshold, 0.6);
        assert_eq!(config.dedup.min_content_length, 100);
    }

    #[test]
    fn test_rejects_out_of_range_threshold() {
        let config: Config = toml::from_str("[dedup]\ncontent_threshold = 1.5\n").unwrap();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_rejects_bad_skip_pattern() {
        let config: Config = toml::from_str("[links]\nskip_patterns = [\"(unclosed\"]\n").unwrap();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config =
            load_config_or_default(Path::new("/definitely/not/here/failbook.toml")).unwrap();
        assert_eq!(config.catalog.root, PathBuf::from("."));
    }

    #[test]
    fn test_missing_file_is_error_for_load_config() {
        assert!(load_config(Path::new("/definitely/not/here/failbook.toml")).is_err());
    }

    #[test]
    fn test_catalog_paths() {
        let config: Config =
            toml::from_str("[catalog]\nroot = \"/repo\"\nsummary = \"docs/WEEKLY.md\"\n").unwrap();
        assert_eq!(
            config.catalog.submissions_path(),
            PathBuf::from("/repo/submissions")
        );
        assert_eq!(config.catalog.readme_path(), PathBuf::from("/repo/README.md"));
        assert_eq!(
            config.catalog.summary_path(),
            PathBuf::from("/repo/docs/WEEKLY.md")
        );
    }
}
