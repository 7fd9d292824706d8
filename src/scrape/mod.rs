//! Company-website scraping
//!
//! Fetches the selected company's site (root plus the usual about pages),
//! strips boilerplate markup and writes one combined corpus snapshot file.
//! The snapshot is overwritten wholesale on every scrape; only one company
//! is active at a time.
//!
//! Per-URL failures are best-effort: logged and skipped, never fatal to the
//! snapshot as a whole.

use crate::config::ScrapeConfig;
use crate::leads::LeadRecord;
use crate::{log_info, log_warn};
use ego_tree::NodeRef;
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{Html, Node};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Fixed corpus snapshot filename under the data directory
pub const SNAPSHOT_FILE: &str = "scraped_content.txt";

/// Subtrees dropped before text extraction
const EXCLUDED_TAGS: [&str; 6] = ["script", "style", "noscript", "footer", "header", "nav"];

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Scraping errors
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Company-page scraper
pub struct Scraper {
    client: reqwest::Client,
    config: ScrapeConfig,
}

impl Scraper {
    pub fn new(config: ScrapeConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();

        Self { client, config }
    }

    /// Fetch one URL and reduce it to cleaned text
    pub async fn fetch_clean_text(&self, url: &str) -> Result<String, ScrapeError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, &self.config.user_agent)
            .send()
            .await
            .map_err(|source| ScrapeError::Fetch {
                url: url.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status: response.status(),
            });
        }

        let body = response.text().await.map_err(|source| ScrapeError::Fetch {
            url: url.to_string(),
            source,
        })?;

        Ok(clean_html(&body))
    }

    /// Scrape the company's pages into the corpus snapshot file.
    ///
    /// The snapshot opens with a one-line summary built from the record, then
    /// the cleaned text of every page that could be fetched. Returns the
    /// snapshot path.
    pub async fn snapshot_company(
        &self,
        record: &LeadRecord,
        data_dir: &Path,
    ) -> Result<PathBuf, ScrapeError> {
        let summary = format!(
            "{} is a {} located in {}, {}.",
            record.company,
            record.industry.as_deref().unwrap_or("N/A"),
            record.city.as_deref().unwrap_or("N/A"),
            record.state.as_deref().unwrap_or("N/A"),
        );

        let mut combined = format!("== Company Summary ==\n{}\n\n", summary);

        for url in candidate_urls(record.website.as_deref()) {
            log_info!("Scraping {}", url);
            match self.fetch_clean_text(&url).await {
                Ok(content) => combined.push_str(&content),
                Err(e) => log_warn!("Skipping page: {}", e),
            }
        }

        std::fs::create_dir_all(data_dir)?;
        let path = data_dir.join(SNAPSHOT_FILE);
        std::fs::write(&path, &combined)?;
        log_info!(
            "Saved corpus snapshot for {} ({} chars)",
            record.company,
            combined.chars().count()
        );

        Ok(path)
    }
}

/// Path of the corpus snapshot under the data directory
pub fn snapshot_path(data_dir: &Path) -> PathBuf {
    data_dir.join(SNAPSHOT_FILE)
}

/// Pages worth scraping for a company website
fn candidate_urls(website: Option<&str>) -> Vec<String> {
    let Some(base) = website else {
        return Vec::new();
    };
    let base = base.trim_end_matches('/');
    if base.is_empty() || base == "NA" {
        return Vec::new();
    }

    vec![
        base.to_string(),
        format!("{}/about", base),
        format!("{}/about-us", base),
    ]
}

/// Strip excluded subtrees from an HTML document and collapse the remaining
/// text to single-space-separated words.
pub fn clean_html(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut raw = String::new();
    collect_text(document.tree.root(), &mut raw);
    WHITESPACE.replace_all(raw.trim(), " ").into_owned()
}

fn collect_text(node: NodeRef<'_, Node>, out: &mut String) {
    if let Some(element) = node.value().as_element() {
        if EXCLUDED_TAGS.contains(&element.name()) {
            return;
        }
    }

    if let Some(text) = node.value().as_text() {
        out.push_str(text);
        out.push(' ');
    }

    for child in node.children() {
        collect_text(child, out);
    }
}
