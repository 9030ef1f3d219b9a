//! Persistence collaborator — accepts one ordered, immutable snapshot of
//! ranked results per run.
//!
//! Two backends: a JSON file (default, no infrastructure needed) and
//! Postgres for dashboard consumers. Selection happens at startup from
//! `DATABASE_URL`.

use async_trait::async_trait;
use serde_json::json;
use sqlx::PgPool;
use tracing::info;

use crate::errors::PipelineError;
use crate::pipeline::records::RunReport;

#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Persists the full run. Called at most once per run, after ranking.
    async fn save_run(&self, report: &RunReport) -> Result<(), PipelineError>;
}

/// Writes the run report as pretty JSON. The write goes to a sibling temp
/// file first and is renamed into place, so readers never see a torn file.
pub struct JsonFileStore {
    path: std::path::PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl LeadStore for JsonFileStore {
    async fn save_run(&self, report: &RunReport) -> Result<(), PipelineError> {
        let body = serde_json::to_vec_pretty(report)?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        info!(path = %self.path.display(), leads = report.leads.len(), "run persisted");
        Ok(())
    }
}

/// Persists runs and leads to Postgres.
///
/// Expected schema:
///   prospect_runs(id uuid pk, success bool, failure text,
///                 started_at timestamptz, finished_at timestamptz,
///                 postings_scraped int, companies_grouped int)
///   prospect_leads(id uuid pk, run_id uuid fk, company_name text,
///                  posting_count int, total_score float8, tier text,
///                  detail jsonb, rank int)
pub struct PgLeadStore {
    pool: PgPool,
}

impl PgLeadStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeadStore for PgLeadStore {
    async fn save_run(&self, report: &RunReport) -> Result<(), PipelineError> {
        sqlx::query(
            r#"
            INSERT INTO prospect_runs
                (id, success, failure, started_at, finished_at,
                 postings_scraped, companies_grouped)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(report.run_id)
        .bind(report.success)
        .bind(&report.failure)
        .bind(report.started_at)
        .bind(report.finished_at)
        .bind(report.postings_scraped as i32)
        .bind(report.companies_grouped as i32)
        .execute(&self.pool)
        .await?;

        for (rank, lead) in report.leads.iter().enumerate() {
            let detail = json!({
                "score": lead.score,
                "opportunities": lead.opportunities,
                "profile": lead.profile,
                "pain_points": lead.pain_points,
                "annotations": lead.annotations,
            });
            sqlx::query(
                r#"
                INSERT INTO prospect_leads
                    (id, run_id, company_name, posting_count, total_score, tier, detail, rank)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(uuid::Uuid::new_v4())
            .bind(report.run_id)
            .bind(&lead.company_name)
            .bind(lead.posting_count as i32)
            .bind(lead.score.total_score)
            .bind(format!("{:?}", lead.tier()).to_uppercase())
            .bind(&detail)
            .bind(rank as i32 + 1)
            .execute(&self.pool)
            .await?;
        }

        info!(run = %report.run_id, leads = report.leads.len(), "run persisted to Postgres");
        Ok(())
    }
}
