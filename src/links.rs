//! Link checking for submission files.
//!
//! Links are pulled from markdown link targets and bare `http(s)` URLs.
//! Each URL is first classified offline (skip patterns, malformed URLs,
//! trusted and bot-hostile domains); only the rest are probed over HTTP.
//! URLs within one file are probed concurrently, bounded by
//! `links.max_concurrent`.

use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};
use reqwest::{StatusCode, Url};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::{Config, LinksConfig};
use crate::submission::discover_submissions;
use crate::validate::display_name;

/// Outcome of checking one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkStatus {
    /// Matched a skip pattern (anchors, mail links, local hosts).
    Skipped,
    /// Known reliable domain, not requested.
    Trusted,
    /// Domain that tends to block bots; not requested, counted as valid.
    Warned,
    /// Final HTTP status in the 200..=399 range.
    Ok(u16),
    Broken(String),
}

impl LinkStatus {
    pub fn is_valid(&self) -> bool {
        !matches!(self, LinkStatus::Broken(_))
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkStatus::Skipped => write!(f, "Skipped (internal/special link)"),
            LinkStatus::Trusted => write!(f, "OK (trusted domain)"),
            LinkStatus::Warned => write!(f, "Warning: Domain may block automated requests"),
            LinkStatus::Ok(code) => write!(f, "OK ({})", code),
            LinkStatus::Broken(reason) => write!(f, "{}", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkResult {
    pub url: String,
    pub status: LinkStatus,
}

/// Link results for one file, ordered by URL.
#[derive(Debug, Clone)]
pub struct FileLinkReport {
    pub path: PathBuf,
    pub results: Vec<LinkResult>,
}

impl FileLinkReport {
    pub fn all_valid(&self) -> bool {
        self.results.iter().all(|r| r.status.is_valid())
    }

    pub fn broken(&self) -> impl Iterator<Item = &LinkResult> {
        self.results.iter().filter(|r| !r.status.is_valid())
    }
}

/// Finds link targets in markdown text.
pub struct LinkExtractor {
    markdown: Regex,
    raw: Regex,
    trailing: Regex,
}

impl LinkExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            markdown: Regex::new(r"\[([^\]]*)\]\(([^)]+)\)")?,
            raw: Regex::new(r#"https?://[^\s\)\]"'<>]+"#)?,
            trailing: Regex::new(r"[.,;:!?]+$")?,
        })
    }

    /// Markdown link targets plus bare URLs (trailing punctuation
    /// removed), deduplicated and sorted.
    pub fn extract(&self, content: &str) -> BTreeSet<String> {
        let mut links = BTreeSet::new();

        for cap in self.markdown.captures_iter(content) {
            if let Some(target) = cap.get(2) {
                links.insert(target.as_str().trim().to_string());
            }
        }

        for m in self.raw.find_iter(content) {
            let url = self.trailing.replace(m.as_str().trim(), "");
            links.insert(url.into_owned());
        }

        links
    }
}

/// Checks URLs against the configured rules and over HTTP.
pub struct LinkChecker {
    client: reqwest::Client,
    extractor: LinkExtractor,
    skip_patterns: Vec<Regex>,
    warn_domains: Vec<String>,
    trusted_domains: Vec<String>,
    max_concurrent: usize,
}

impl LinkChecker {
    pub fn new(config: &LinksConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        let skip_patterns = config
            .skip_patterns
            .iter()
            .map(|p| {
                RegexBuilder::new(p)
                    .case_insensitive(true)
                    .build()
                    .with_context(|| format!("Invalid skip pattern: '{}'", p))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            client,
            extractor: LinkExtractor::new()?,
            skip_patterns,
            warn_domains: lowercase_all(&config.warn_domains),
            trusted_domains: lowercase_all(&config.trusted_domains),
            max_concurrent: config.max_concurrent.max(1),
        })
    }

    /// Decide a URL without touching the network. `None` means the URL
    /// needs an HTTP probe.
    pub fn classify(&self, url: &str) -> Option<LinkStatus> {
        if self.skip_patterns.iter().any(|re| re.is_match(url)) {
            return Some(LinkStatus::Skipped);
        }

        let host = match Url::parse(url) {
            Ok(parsed) => match parsed.host_str() {
                Some(host) if !host.is_empty() => host.to_lowercase(),
                _ => return Some(LinkStatus::Broken("Invalid URL format".to_string())),
            },
            Err(_) => return Some(LinkStatus::Broken("Invalid URL format".to_string())),
        };

        if self.trusted_domains.iter().any(|d| host.contains(d.as_str())) {
            return Some(LinkStatus::Trusted);
        }
        if self.warn_domains.iter().any(|d| host.contains(d.as_str())) {
            return Some(LinkStatus::Warned);
        }
        None
    }

    pub async fn check_link(&self, url: &str) -> LinkStatus {
        match self.classify(url) {
            Some(status) => status,
            None => self.probe(url).await,
        }
    }

    /// HEAD the URL, falling back to GET when the server rejects HEAD.
    /// The GET body is never read.
    async fn probe(&self, url: &str) -> LinkStatus {
        let response = match self.client.head(url).send().await {
            Ok(resp) if resp.status() == StatusCode::METHOD_NOT_ALLOWED => {
                self.client.get(url).send().await
            }
            other => other,
        };

        match response {
            Ok(resp) => {
                let status = resp.status();
                if status.is_success() || status.is_redirection() {
                    LinkStatus::Ok(status.as_u16())
                } else {
                    LinkStatus::Broken(format!("HTTP {}", status.as_u16()))
                }
            }
            Err(e) => {
                tracing::debug!(url, error = %e, "link request failed");
                LinkStatus::Broken(describe_request_error(&e))
            }
        }
    }

    /// Check a set of URLs concurrently. Results come back in input order.
    pub async fn check_links(self: &Arc<Self>, urls: Vec<String>) -> Vec<LinkResult> {
        let sem = Arc::new(Semaphore::new(self.max_concurrent));
        let mut join_set = JoinSet::new();

        for (idx, url) in urls.into_iter().enumerate() {
            let checker = Arc::clone(self);
            let sem = Arc::clone(&sem);
            join_set.spawn(async move {
                let _permit = sem.acquire_owned().await.ok();
                let status = checker.check_link(&url).await;
                (idx, LinkResult { url, status })
            });
        }

        let mut results = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => tracing::warn!(error = %e, "link check task failed"),
            }
        }
        results.sort_by_key(|(idx, _)| *idx);
        results.into_iter().map(|(_, r)| r).collect()
    }

    /// Check every link in one file. An unreadable file is reported as a
    /// single broken entry with an empty URL.
    pub async fn check_file_links(self: &Arc<Self>, path: &Path) -> FileLinkReport {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) => {
                return FileLinkReport {
                    path: path.to_path_buf(),
                    results: vec![LinkResult {
                        url: String::new(),
                        status: LinkStatus::Broken(format!("Failed to read file: {}", e)),
                    }],
                }
            }
        };

        let urls: Vec<String> = self.extractor.extract(&content).into_iter().collect();
        tracing::debug!(path = %path.display(), links = urls.len(), "checking links");

        FileLinkReport {
            path: path.to_path_buf(),
            results: self.check_links(urls).await,
        }
    }
}

fn lowercase_all(domains: &[String]) -> Vec<String> {
    domains.iter().map(|d| d.to_lowercase()).collect()
}

fn describe_request_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "Timeout".to_string()
    } else if e.is_redirect() {
        "Too many redirects".to_string()
    } else if e.is_connect() {
        "Connection error".to_string()
    } else {
        format!("Request error: {}", e)
    }
}

/// Check links in the given files (or every submission when none are
/// given), print a report, and return whether every link is valid.
pub async fn run_links(config: &Config, files: &[PathBuf]) -> Result<bool> {
    let files = if files.is_empty() {
        discover_submissions(config)?
    } else {
        files.to_vec()
    };

    if files.is_empty() {
        println!("No files to check for links.");
        return Ok(true);
    }

    let checker = Arc::new(LinkChecker::new(&config.links)?);
    println!("Checking links in {} file(s)...", files.len());
    println!();

    let mut all_valid = true;
    let mut total_links = 0;
    let mut broken_links = 0;

    for path in &files {
        println!("{}", display_name(path));
        let report = checker.check_file_links(path).await;

        if report.results.is_empty() {
            println!("   No links found");
            println!();
            continue;
        }

        total_links += report.results.len();
        if report.all_valid() {
            println!("   All {} link(s) valid", report.results.len());
        } else {
            all_valid = false;
            for result in report.broken() {
                broken_links += 1;
                println!("   broken: {}", result.url);
                println!("      Error: {}", result.status);
            }
        }
        println!();
    }

    println!("{}", "=".repeat(60));
    println!(
        "Summary: {} link(s) checked, {} broken",
        total_links, broken_links
    );
    println!();
    if all_valid {
        println!("All links are valid.");
    } else {
        println!("Some links are broken. Please fix them and try again.");
    }

    Ok(all_valid)
}
