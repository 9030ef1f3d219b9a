//! Scraper collaborator — fetches job postings from a paginated JSON feed.
//!
//! Interface guarantees the pipeline relies on: no duplicate urls in one
//! call's result, and low-quality titles already filtered out. A failure on
//! the first page is unrecoverable; failures on later pages return whatever
//! was collected so far (partial results).

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{info, warn};

use crate::errors::PipelineError;
use crate::models::job::JobPosting;

/// Titles shorter than this (after trimming) are discarded as junk rows.
const MIN_TITLE_LEN: usize = 4;

#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub feed_url: String,
    pub max_pages: u32,
}

#[async_trait]
pub trait JobScraper: Send + Sync {
    async fn scrape_listings(&self, config: &ScrapeConfig)
        -> Result<Vec<JobPosting>, PipelineError>;
}

/// One row as the feed serves it. Field names follow the board's API.
#[derive(Debug, Deserialize)]
struct FeedPosting {
    title: String,
    url: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    location: String,
    #[serde(default)]
    company: String,
    #[serde(default)]
    posted_date: Option<NaiveDate>,
}

/// Scraper over a paginated JSON feed (`{feed_url}?page=N` returning an
/// array of postings). An empty page ends pagination early.
pub struct FeedScraper {
    client: reqwest::Client,
}

impl FeedScraper {
    pub fn new() -> Result<Self, PipelineError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| PipelineError::Scrape(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    async fn fetch_page(&self, feed_url: &str, page: u32) -> Result<Vec<FeedPosting>, PipelineError> {
        let response = self
            .client
            .get(feed_url)
            .query(&[("page", page)])
            .send()
            .await
            .map_err(|e| PipelineError::Scrape(format!("page {page} fetch failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::Scrape(format!(
                "page {page} returned status {status}"
            )));
        }

        response
            .json::<Vec<FeedPosting>>()
            .await
            .map_err(|e| PipelineError::Scrape(format!("page {page} body invalid: {e}")))
    }
}

#[async_trait]
impl JobScraper for FeedScraper {
    async fn scrape_listings(
        &self,
        config: &ScrapeConfig,
    ) -> Result<Vec<JobPosting>, PipelineError> {
        let mut seen_urls: HashSet<String> = HashSet::new();
        let mut postings = Vec::new();

        for page in 1..=config.max_pages {
            let rows = match self.fetch_page(&config.feed_url, page).await {
                Ok(rows) => rows,
                Err(e) if page == 1 => return Err(e),
                Err(e) => {
                    // Later pages degrade to partial results.
                    warn!("stopping pagination after error: {e}");
                    break;
                }
            };

            if rows.is_empty() {
                break;
            }

            for row in rows {
                postings.extend(accept_row(row, &mut seen_urls));
            }
        }

        info!(count = postings.len(), "scrape finished");
        Ok(postings)
    }
}

/// Applies the dedup and title-quality guarantees to one feed row.
fn accept_row(row: FeedPosting, seen_urls: &mut HashSet<String>) -> Option<JobPosting> {
    let title = row.title.trim();
    if title.len() < MIN_TITLE_LEN {
        return None;
    }
    if !seen_urls.insert(row.url.clone()) {
        return None;
    }
    Some(JobPosting {
        title: title.to_string(),
        url: row.url,
        description: row.description,
        location: row.location,
        company: row.company,
        posted_date: row.posted_date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(title: &str, url: &str) -> FeedPosting {
        FeedPosting {
            title: title.to_string(),
            url: url.to_string(),
            description: "desc".to_string(),
            location: "Austin, TX".to_string(),
            company: "Acme".to_string(),
            posted_date: None,
        }
    }

    #[test]
    fn test_duplicate_urls_are_dropped() {
        let mut seen = HashSet::new();
        assert!(accept_row(row("Technician", "https://x/1"), &mut seen).is_some());
        assert!(accept_row(row("Technician II", "https://x/1"), &mut seen).is_none());
        assert!(accept_row(row("Dispatcher", "https://x/2"), &mut seen).is_some());
    }

    #[test]
    fn test_short_titles_are_filtered() {
        let mut seen = HashSet::new();
        assert!(accept_row(row("??", "https://x/1"), &mut seen).is_none());
        assert!(accept_row(row("  a  ", "https://x/2"), &mut seen).is_none());
        assert!(accept_row(row("HVAC", "https://x/3"), &mut seen).is_some());
    }

    #[test]
    fn test_feed_posting_deserializes_with_missing_optionals() {
        let json = r#"{"title": "Technician", "url": "https://x/1"}"#;
        let row: FeedPosting = serde_json::from_str(json).unwrap();
        assert_eq!(row.title, "Technician");
        assert!(row.description.is_empty());
        assert!(row.posted_date.is_none());
    }
}
