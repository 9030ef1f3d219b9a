mod config;
mod db;
mod enrich;
mod errors;
mod llm_client;
mod models;
mod pipeline;
mod progress;
mod scoring;
mod scrape;
mod store;

use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::enrich::parser::{LlmPostingParser, PostingParser};
use crate::enrich::research::{CompanyResearcher, LlmResearcher, NoopResearcher};
use crate::llm_client::LlmClient;
use crate::pipeline::orchestrator::{Orchestrator, PipelineSettings};
use crate::progress::StageStatus;
use crate::scoring::scorer::KeywordLeadScorer;
use crate::scrape::FeedScraper;
use crate::store::{JsonFileStore, LeadStore, PgLeadStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Prospector v{}", env!("CARGO_PKG_VERSION"));

    // Lead store: Postgres when configured, otherwise a local JSON file.
    let store: Arc<dyn LeadStore> = match &config.database_url {
        Some(url) => {
            let pool = create_pool(url).await?;
            Arc::new(PgLeadStore::new(pool))
        }
        None => {
            info!("No DATABASE_URL set, writing leads to {}", config.output_path.display());
            Arc::new(JsonFileStore::new(config.output_path.clone()))
        }
    };

    let llm = LlmClient::new(config.anthropic_api_key.clone())?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let scraper = Arc::new(FeedScraper::new()?);
    let parser: Arc<dyn PostingParser> = Arc::new(LlmPostingParser::new(llm.clone()));
    let researcher: Arc<dyn CompanyResearcher> = if config.use_company_research {
        Arc::new(LlmResearcher::new(llm))
    } else {
        Arc::new(NoopResearcher)
    };
    let scorer = Arc::new(KeywordLeadScorer::default());

    let settings = PipelineSettings::from_config(&config);
    let orchestrator = Orchestrator::new(scraper, parser, researcher, scorer, store, settings);

    let progress = orchestrator.progress();
    progress.on_update(|snapshot| {
        // Stages run in order, so the last touched stage is the active one.
        if let Some(stage) = snapshot
            .stages
            .iter()
            .rev()
            .find(|s| s.status != StageStatus::Pending)
        {
            info!(
                stage = %stage.name,
                status = ?stage.status,
                progress = format!("{:.0}%", stage.progress * 100.0),
                overall = format!("{:.0}%", snapshot.overall_progress * 100.0),
                "{}",
                stage.message
            );
        }
    });

    let report = orchestrator.run(&progress).await;

    info!(
        run_id = %report.run_id,
        postings = report.postings_scraped,
        companies = report.companies_grouped,
        leads = report.leads.len(),
        errors = report.item_errors,
        "run summary"
    );
    for (rank, lead) in report.leads.iter().enumerate() {
        info!(
            rank = rank + 1,
            company = %lead.company_name,
            score = format!("{:.1}", lead.score.total_score),
            tier = ?lead.tier(),
            postings = lead.posting_count,
            "lead"
        );
    }

    if !report.success {
        let reason = report.failure.as_deref().unwrap_or("unknown");
        anyhow::bail!("pipeline run failed: {reason}");
    }
    Ok(())
}
