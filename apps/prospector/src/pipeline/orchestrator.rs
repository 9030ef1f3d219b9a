//! Orchestrator — sequences the prospecting pipeline end to end.
//!
//! Flow: scrape → filter_group → parse → signal_analyze → [research] →
//!       score → match_opportunities → persist.
//!
//! Stages run in strict order per run. Per-company work inside the parse
//! and research stages fans out on a bounded worker pool, but every company
//! moves through the stages in order and results are re-sorted by name at
//! each fan-in, so fan-out never changes the output. Two guards drop work
//! before it costs anything: the hiring-count filter runs before any
//! network stage, and the lead-score threshold runs before persistence.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::enrich::parser::PostingParser;
use crate::enrich::research::CompanyResearcher;
use crate::errors::PipelineError;
use crate::models::company::{group_by_company, CompanyGroup};
use crate::pipeline::records::{
    AnalyzedCompany, ParsedCompany, RankedLead, ResearchedCompany, RunReport, ScrapedBatch,
};
use crate::pipeline::runner::{run_stage, RetryPolicy};
use crate::progress::PipelineProgress;
use crate::scoring::matcher::match_opportunities;
use crate::scoring::scorer::{extract_evidence, LeadScorer, ScoreResult};
use crate::scrape::{JobScraper, ScrapeConfig};
use crate::store::LeadStore;

/// Stage names, also used as progress record keys.
pub mod stage {
    pub const SCRAPE: &str = "scrape";
    pub const FILTER_GROUP: &str = "filter_group";
    pub const PARSE: &str = "parse";
    pub const SIGNAL_ANALYZE: &str = "signal_analyze";
    pub const RESEARCH: &str = "research";
    pub const SCORE: &str = "score";
    pub const MATCH_OPPORTUNITIES: &str = "match_opportunities";
    pub const PERSIST: &str = "persist";
}

/// The full stage sequence, in execution order.
pub const STAGES: &[(&str, &str)] = &[
    (stage::SCRAPE, "Scrape job postings from the board feed"),
    (stage::FILTER_GROUP, "Group postings by company and filter by hiring count"),
    (stage::PARSE, "Extract structured fields from postings"),
    (stage::SIGNAL_ANALYZE, "Detect growth and capacity signals"),
    (stage::RESEARCH, "Research promising companies"),
    (stage::SCORE, "Score companies on hiring signals"),
    (stage::MATCH_OPPORTUNITIES, "Match scored companies to services"),
    (stage::PERSIST, "Persist the ranked lead list"),
];

/// Thresholds and limits the orchestrator applies between stages.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub min_company_jobs: usize,
    pub min_growth_score: f64,
    pub min_lead_score: f64,
    pub use_company_research: bool,
    pub max_retries: u32,
    pub worker_limit: usize,
    pub scrape: ScrapeConfig,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            min_company_jobs: config.min_company_jobs,
            min_growth_score: config.min_growth_score,
            min_lead_score: config.min_lead_score,
            use_company_research: config.use_company_research,
            max_retries: config.max_retries,
            worker_limit: config.worker_limit,
            scrape: ScrapeConfig {
                feed_url: config.feed_url.clone(),
                max_pages: config.max_pages,
            },
        }
    }
}

/// Owns the collaborators and drives one run at a time. Each call to `run`
/// gets its own progress handle; the orchestrator holds no run state.
pub struct Orchestrator {
    scraper: Arc<dyn JobScraper>,
    parser: Arc<dyn PostingParser>,
    researcher: Arc<dyn CompanyResearcher>,
    scorer: Arc<dyn LeadScorer>,
    store: Arc<dyn LeadStore>,
    settings: PipelineSettings,
}

impl Orchestrator {
    pub fn new(
        scraper: Arc<dyn JobScraper>,
        parser: Arc<dyn PostingParser>,
        researcher: Arc<dyn CompanyResearcher>,
        scorer: Arc<dyn LeadScorer>,
        store: Arc<dyn LeadStore>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            scraper,
            parser,
            researcher,
            scorer,
            store,
            settings,
        }
    }

    /// A progress handle pre-registered with this pipeline's stages.
    /// Callers register observers on it before passing it to `run`.
    pub fn progress(&self) -> PipelineProgress {
        PipelineProgress::new(STAGES)
    }

    /// Runs the pipeline to completion. Failure is data: a failed run comes
    /// back as a report with `success == false`, never as an error.
    pub async fn run(&self, progress: &PipelineProgress) -> RunReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(%run_id, "pipeline run starting");

        // SCRAPE
        progress.stage_start(stage::SCRAPE, 0, "fetching job board feed");
        let batch = self.scrape().await;
        let postings_scraped = batch.postings.len();

        if batch.postings.is_empty() {
            // Fatal-for-run: nothing downstream can produce results.
            let reason = batch
                .annotations
                .first()
                .and_then(|a| a.error.clone())
                .unwrap_or_else(|| "no postings found".to_string());
            progress.stage_fail(stage::SCRAPE, &reason);
            for (name, _) in &STAGES[1..] {
                progress.stage_skip(name, "run aborted before this stage");
            }
            warn!(%run_id, "run failed: {reason}");
            return RunReport {
                run_id,
                success: false,
                failure: Some(reason),
                started_at,
                finished_at: Utc::now(),
                postings_scraped: 0,
                companies_grouped: 0,
                companies_qualified: 0,
                companies_disqualified: 0,
                companies_below_threshold: 0,
                item_errors: 0,
                leads: Vec::new(),
            };
        }
        progress.stage_complete(
            stage::SCRAPE,
            Some(postings_scraped.to_string()),
            &format!("{postings_scraped} postings"),
        );

        // FILTER_GROUP — the free in-memory filter runs before any company
        // can reach a network-calling stage.
        progress.stage_start(stage::FILTER_GROUP, 0, "grouping postings by company");
        let groups = group_by_company(batch.postings);
        let companies_grouped = groups.len();
        let min_jobs = self.settings.min_company_jobs;
        let qualified: Vec<CompanyGroup> = groups
            .into_iter()
            .filter(|g| g.postings.len() >= min_jobs)
            .collect();
        let companies_qualified = qualified.len();
        progress.stage_complete(
            stage::FILTER_GROUP,
            Some(companies_qualified.to_string()),
            &format!(
                "{companies_qualified} of {companies_grouped} companies have >= {min_jobs} postings"
            ),
        );

        // PARSE — network, fan-out across companies.
        progress.stage_start(stage::PARSE, qualified.len(), "extracting posting fields");
        let mut parsed = self.parse_companies(qualified, progress).await;
        parsed.sort_by(|a, b| a.group.name.cmp(&b.group.name));
        progress.stage_complete(stage::PARSE, Some(parsed.len().to_string()), "parse done");

        // SIGNAL_ANALYZE — pure, no suspension.
        progress.stage_start(stage::SIGNAL_ANALYZE, parsed.len(), "detecting signals");
        let mut analyzed = Vec::with_capacity(parsed.len());
        for (i, record) in parsed.into_iter().enumerate() {
            let evidence = extract_evidence(&record.group);
            progress.stage_update(stage::SIGNAL_ANALYZE, i + 1, &record.group.name);
            analyzed.push(AnalyzedCompany {
                parsed: record,
                evidence,
            });
        }
        progress.stage_complete(stage::SIGNAL_ANALYZE, None, "signals extracted");

        // RESEARCH — optional; disabled config is equivalent to "no enrichment".
        let researched: Vec<ResearchedCompany> = if self.settings.use_company_research {
            progress.stage_start(stage::RESEARCH, analyzed.len(), "researching companies");
            let mut records = self.research_companies(analyzed, progress).await;
            records.sort_by(|a, b| {
                a.analyzed.parsed.group.name.cmp(&b.analyzed.parsed.group.name)
            });
            progress.stage_complete(stage::RESEARCH, None, "research done");
            records
        } else {
            progress.stage_skip(stage::RESEARCH, "research disabled");
            analyzed
                .into_iter()
                .map(|analyzed| ResearchedCompany {
                    analyzed,
                    profile: None,
                })
                .collect()
        };

        // Annotations accumulated so far count as item errors even when a
        // company is later dropped from the ranking.
        let annotated_errors: usize = researched
            .iter()
            .map(|r| r.analyzed.parsed.annotations.len())
            .sum();

        // SCORE — deterministic; sequential so progress mirrors the ranking.
        progress.stage_start(stage::SCORE, researched.len(), "scoring companies");
        let mut scored: Vec<(ResearchedCompany, ScoreResult)> =
            Vec::with_capacity(researched.len());
        let mut score_errors = 0usize;
        for (i, record) in researched.into_iter().enumerate() {
            let name = record.analyzed.parsed.group.name.clone();
            progress.stage_update(stage::SCORE, i + 1, &name);
            match self.scorer.score(&record.analyzed.parsed.group).await {
                Ok(score) => scored.push((record, score)),
                Err(e) => {
                    warn!(company = %name, "scoring failed, dropping company: {e}");
                    score_errors += 1;
                }
            }
        }
        progress.stage_complete(stage::SCORE, Some(scored.len().to_string()), "scoring done");

        let companies_disqualified = scored.iter().filter(|(_, s)| s.disqualified).count();
        let min_lead_score = self.settings.min_lead_score;
        let companies_below_threshold = scored
            .iter()
            .filter(|(_, s)| !s.disqualified && s.total_score < min_lead_score)
            .count();
        let survivors: Vec<_> = scored
            .into_iter()
            .filter(|(_, s)| !s.disqualified && s.total_score >= min_lead_score)
            .collect();

        // MATCH_OPPORTUNITIES — pure.
        progress.stage_start(stage::MATCH_OPPORTUNITIES, survivors.len(), "matching services");
        let mut leads = Vec::with_capacity(survivors.len());
        for (i, (record, score)) in survivors.into_iter().enumerate() {
            let group = &record.analyzed.parsed.group;
            progress.stage_update(stage::MATCH_OPPORTUNITIES, i + 1, &group.name);
            let opportunities = match_opportunities(group, &score);
            leads.push(RankedLead {
                company_name: group.name.clone(),
                posting_count: group.postings.len(),
                score,
                opportunities,
                profile: record.profile,
                pain_points: collect_pain_points(&record.analyzed.parsed.enrichments),
                annotations: record.analyzed.parsed.annotations,
            });
        }
        progress.stage_complete(
            stage::MATCH_OPPORTUNITIES,
            Some(leads.len().to_string()),
            "matching done",
        );

        // Rank: score descending, company name as the tie-break.
        leads.sort_by(|a, b| {
            b.score
                .total_score
                .partial_cmp(&a.score.total_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.company_name.cmp(&b.company_name))
        });

        let mut report = RunReport {
            run_id,
            success: true,
            failure: None,
            started_at,
            finished_at: Utc::now(),
            postings_scraped,
            companies_grouped,
            companies_qualified,
            companies_disqualified,
            companies_below_threshold,
            item_errors: annotated_errors + score_errors,
            leads,
        };

        // PERSIST — one ordered, immutable snapshot per run.
        progress.stage_start(stage::PERSIST, 1, "saving ranked leads");
        match self.store.save_run(&report).await {
            Ok(()) => {
                progress.stage_complete(
                    stage::PERSIST,
                    Some(report.leads.len().to_string()),
                    "saved",
                );
            }
            Err(e) => {
                progress.stage_fail(stage::PERSIST, &e.to_string());
                report.success = false;
                report.failure = Some(format!("persist failed: {e}"));
            }
        }

        report.finished_at = Utc::now();
        info!(
            %run_id,
            success = report.success,
            leads = report.leads.len(),
            errors = report.item_errors,
            "pipeline run finished"
        );
        report
    }

    async fn scrape(&self) -> ScrapedBatch {
        let scraper = self.scraper.clone();
        run_stage(
            stage::SCRAPE,
            &RetryPolicy::network(self.settings.max_retries),
            self.settings.scrape.clone(),
            |config| {
                let scraper = scraper.clone();
                async move {
                    scraper
                        .scrape_listings(&config)
                        .await
                        .map(|postings| ScrapedBatch {
                            postings,
                            annotations: Vec::new(),
                        })
                }
            },
        )
        .await
    }

    async fn parse_companies(
        &self,
        groups: Vec<CompanyGroup>,
        progress: &PipelineProgress,
    ) -> Vec<ParsedCompany> {
        let policy = RetryPolicy::network(self.settings.max_retries);
        let done = Arc::new(AtomicUsize::new(0));

        stream::iter(groups)
            .map(|group| {
                let parser = self.parser.clone();
                let policy = policy.clone();
                let done = done.clone();
                async move {
                    let record = run_stage(stage::PARSE, &policy, group, |g| {
                        let parser = parser.clone();
                        async move {
                            let mut enrichments = Vec::with_capacity(g.postings.len());
                            for posting in &g.postings {
                                enrichments.push(parser.parse(posting).await?);
                            }
                            Ok::<_, PipelineError>(ParsedCompany {
                                group: g,
                                enrichments,
                                annotations: Vec::new(),
                            })
                        }
                    })
                    .await;
                    let current = done.fetch_add(1, Ordering::SeqCst) + 1;
                    progress.stage_update(stage::PARSE, current, &record.group.name);
                    record
                }
            })
            .buffer_unordered(self.settings.worker_limit.max(1))
            .collect()
            .await
    }

    async fn research_companies(
        &self,
        records: Vec<AnalyzedCompany>,
        progress: &PipelineProgress,
    ) -> Vec<ResearchedCompany> {
        let policy = RetryPolicy::network(self.settings.max_retries);
        let min_strength = self.settings.min_growth_score;
        let done = Arc::new(AtomicUsize::new(0));

        stream::iter(records)
            .map(|analyzed| {
                let researcher = self.researcher.clone();
                let policy = policy.clone();
                let done = done.clone();
                async move {
                    let name = analyzed.parsed.group.name.clone();
                    let record = if analyzed.signal_strength() >= min_strength {
                        run_stage(stage::RESEARCH, &policy, analyzed, |a| {
                            let researcher = researcher.clone();
                            async move {
                                let location = a
                                    .parsed
                                    .group
                                    .postings
                                    .first()
                                    .map(|p| p.location.clone())
                                    .unwrap_or_default();
                                let profile =
                                    researcher.research(&a.parsed.group.name, &location).await?;
                                Ok::<_, PipelineError>(ResearchedCompany {
                                    analyzed: a,
                                    profile: (!profile.is_empty()).then_some(profile),
                                })
                            }
                        })
                        .await
                    } else {
                        // Not worth a network call; equivalent to no enrichment.
                        ResearchedCompany {
                            analyzed,
                            profile: None,
                        }
                    };
                    let current = done.fetch_add(1, Ordering::SeqCst) + 1;
                    progress.stage_update(stage::RESEARCH, current, &name);
                    record
                }
            })
            .buffer_unordered(self.settings.worker_limit.max(1))
            .collect()
            .await
    }
}

/// Deduplicated pain points across a company's enriched postings, first
/// mention wins, order preserved.
fn collect_pain_points(enrichments: &[crate::models::job::PostingEnrichment]) -> Vec<String> {
    let mut points = Vec::new();
    for enrichment in enrichments {
        for point in &enrichment.pain_points {
            if !points.iter().any(|p: &String| p.eq_ignore_ascii_case(point)) {
                points.push(point.clone());
            }
        }
    }
    points
}
