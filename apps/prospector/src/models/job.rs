use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Description text used by the scraper's quick-scan mode when a detail page
/// was not fetched. Scoring degrades to title-only matching when it sees this.
pub const QUICK_SCAN_PLACEHOLDER: &str = "quick scan, full details not fetched";

/// One scraped job posting. Immutable once scraped; the url is the unique key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPosting {
    pub title: String,
    pub url: String,
    pub description: String,
    pub location: String,
    /// Best-effort company name as it appeared on the board. May be empty.
    pub company: String,
    pub posted_date: Option<NaiveDate>,
}

impl JobPosting {
    /// Text the signal rules run against. Quick-scan placeholders contribute
    /// the title only so a shallow scrape still scores instead of erroring.
    pub fn signal_text(&self) -> String {
        let desc = self.description.trim();
        if desc.is_empty() || desc.eq_ignore_ascii_case(QUICK_SCAN_PLACEHOLDER) {
            self.title.clone()
        } else {
            format!("{} {}", self.title, desc)
        }
    }
}

/// Fields extracted from a posting by the LLM-backed parser.
/// All fields default to empty — a posting that cannot be parsed simply
/// carries no enrichment, it never aborts the batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostingEnrichment {
    pub company_name: Option<String>,
    pub pain_points: Vec<String>,
    pub skills: Vec<String>,
}

/// Partial company profile returned by the optional research collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub summary: Option<String>,
    pub website: Option<String>,
    pub employee_estimate: Option<u32>,
}

impl CompanyProfile {
    pub fn is_empty(&self) -> bool {
        self.summary.is_none() && self.website.is_none() && self.employee_estimate.is_none()
    }
}
