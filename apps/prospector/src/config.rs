use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Required variables fail fast at startup; thresholds fall back to defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Job board feed to scrape (paginated JSON).
    pub feed_url: String,
    pub anthropic_api_key: String,
    /// When set, leads are persisted to Postgres; otherwise to `output_path`.
    pub database_url: Option<String>,
    pub output_path: PathBuf,

    /// Companies with fewer postings than this never reach a network stage.
    pub min_company_jobs: usize,
    /// Signal strength (0–1) a company needs before research is attempted.
    pub min_growth_score: f64,
    /// Leads scoring below this (0–100) are dropped from the final ranking.
    pub min_lead_score: f64,
    pub max_pages: u32,
    pub use_company_research: bool,
    /// Total attempts per network-bound stage call.
    pub max_retries: u32,
    /// Fan-out width for per-company work within a stage.
    pub worker_limit: usize,

    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            feed_url: require_env("FEED_URL")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            database_url: std::env::var("DATABASE_URL").ok(),
            output_path: std::env::var("OUTPUT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("leads.json")),
            min_company_jobs: env_or("MIN_COMPANY_JOBS", 3)?,
            min_growth_score: env_or("MIN_GROWTH_SCORE", 0.3)?,
            min_lead_score: env_or("MIN_LEAD_SCORE", 40.0)?,
            max_pages: env_or("MAX_PAGES", 3)?,
            use_company_research: env_or("USE_COMPANY_RESEARCH", false)?,
            max_retries: env_or("MAX_RETRIES", 3)?,
            worker_limit: env_or("WORKER_LIMIT", 4)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    <T as FromStr>::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_or_returns_default_when_unset() {
        std::env::remove_var("PROSPECTOR_TEST_UNSET");
        let value: usize = env_or("PROSPECTOR_TEST_UNSET", 7).unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn test_env_or_parses_set_value() {
        std::env::set_var("PROSPECTOR_TEST_SET", "12");
        let value: u32 = env_or("PROSPECTOR_TEST_SET", 3).unwrap();
        assert_eq!(value, 12);
        std::env::remove_var("PROSPECTOR_TEST_SET");
    }

    #[test]
    fn test_env_or_rejects_garbage() {
        std::env::set_var("PROSPECTOR_TEST_BAD", "not-a-number");
        let result: Result<u32> = env_or("PROSPECTOR_TEST_BAD", 3);
        assert!(result.is_err());
        std::env::remove_var("PROSPECTOR_TEST_BAD");
    }
}
