//! Typed records flowing between pipeline stages.
//!
//! Each stage's output composes its input plus the stage's new fields, and
//! failure travels as data: a `StageAnnotation` appended to the record, not
//! an error crossing the stage boundary. `DegradeFrom` is how a stage whose
//! retries are exhausted still produces its output type — the new fields
//! default to empty and the annotation records what happened.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::company::CompanyGroup;
use crate::models::job::{CompanyProfile, JobPosting, PostingEnrichment};
use crate::scoring::matcher::ServiceOpportunity;
use crate::scoring::scorer::{ScoreResult, SignalEvidence, Tier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageOutcome {
    Ok,
    Error,
}

/// Structured replacement for the `{stage}_status` / `{stage}_error` pair:
/// which stage degraded, and why.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageAnnotation {
    pub stage: String,
    pub status: StageOutcome,
    pub error: Option<String>,
}

impl StageAnnotation {
    pub fn error(stage: &str, message: impl Into<String>) -> Self {
        Self {
            stage: stage.to_string(),
            status: StageOutcome::Error,
            error: Some(message.into()),
        }
    }
}

/// Conversion a degraded stage uses to produce its output type from its
/// input when every attempt failed. New fields default to empty, so the
/// annotation is always attachable — even when the input carries nothing.
pub trait DegradeFrom<I>: Sized {
    fn degraded(input: I, note: StageAnnotation) -> Self;
}

/// Output of SCRAPE.
#[derive(Debug, Clone)]
pub struct ScrapedBatch {
    pub postings: Vec<JobPosting>,
    pub annotations: Vec<StageAnnotation>,
}

impl DegradeFrom<crate::scrape::ScrapeConfig> for ScrapedBatch {
    fn degraded(_input: crate::scrape::ScrapeConfig, note: StageAnnotation) -> Self {
        Self {
            postings: Vec::new(),
            annotations: vec![note],
        }
    }
}

/// Output of PARSE for one company: the group plus per-posting enrichment.
#[derive(Debug, Clone)]
pub struct ParsedCompany {
    pub group: CompanyGroup,
    /// Aligned with `group.postings`; empty when the stage degraded.
    pub enrichments: Vec<PostingEnrichment>,
    pub annotations: Vec<StageAnnotation>,
}

impl DegradeFrom<CompanyGroup> for ParsedCompany {
    fn degraded(input: CompanyGroup, note: StageAnnotation) -> Self {
        Self {
            group: input,
            enrichments: Vec::new(),
            annotations: vec![note],
        }
    }
}

/// Output of SIGNAL_ANALYZE: parsed company plus extracted evidence.
#[derive(Debug, Clone)]
pub struct AnalyzedCompany {
    pub parsed: ParsedCompany,
    pub evidence: SignalEvidence,
}

impl AnalyzedCompany {
    /// Coarse strength used to gate the research stage.
    pub fn signal_strength(&self) -> f64 {
        self.evidence.signal_strength()
    }
}

/// Output of RESEARCH (or its skip).
#[derive(Debug, Clone)]
pub struct ResearchedCompany {
    pub analyzed: AnalyzedCompany,
    pub profile: Option<CompanyProfile>,
}

impl DegradeFrom<AnalyzedCompany> for ResearchedCompany {
    fn degraded(input: AnalyzedCompany, note: StageAnnotation) -> Self {
        let mut analyzed = input;
        analyzed.parsed.annotations.push(note);
        Self {
            analyzed,
            profile: None,
        }
    }
}

/// A company that survived scoring and thresholding, ready to persist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedLead {
    pub company_name: String,
    pub posting_count: usize,
    pub score: ScoreResult,
    pub opportunities: Vec<ServiceOpportunity>,
    pub profile: Option<CompanyProfile>,
    /// Deduplicated pain points aggregated from posting enrichment.
    pub pain_points: Vec<String>,
    pub annotations: Vec<StageAnnotation>,
}

impl RankedLead {
    pub fn tier(&self) -> Tier {
        self.score.tier
    }
}

/// Final report for one pipeline run. Failure is represented here, not
/// raised: a failed run has `success == false` and a reason.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub success: bool,
    pub failure: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    pub postings_scraped: usize,
    pub companies_grouped: usize,
    /// Companies that passed the hiring-count filter.
    pub companies_qualified: usize,
    /// Business-rule exclusions (agency/spam), distinct from errors.
    pub companies_disqualified: usize,
    pub companies_below_threshold: usize,
    /// Per-item processing errors that were annotated and skipped past.
    pub item_errors: usize,

    pub leads: Vec<RankedLead>,
}
