//! Company research collaborator — optional enrichment stage.
//!
//! Disabled research must be indistinguishable from research that found
//! nothing, so `NoopResearcher` returns an empty profile.

use async_trait::async_trait;

use crate::enrich::prompts::{RESEARCH_SYSTEM, RESEARCH_TEMPLATE};
use crate::errors::PipelineError;
use crate::llm_client::prompts::{JSON_ONLY_INSTRUCTION, NO_FABRICATION_INSTRUCTION};
use crate::llm_client::LlmClient;
use crate::models::job::CompanyProfile;

#[async_trait]
pub trait CompanyResearcher: Send + Sync {
    async fn research(&self, company: &str, location: &str)
        -> Result<CompanyProfile, PipelineError>;
}

pub struct LlmResearcher {
    llm: LlmClient,
}

impl LlmResearcher {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl CompanyResearcher for LlmResearcher {
    async fn research(
        &self,
        company: &str,
        location: &str,
    ) -> Result<CompanyProfile, PipelineError> {
        let prompt = RESEARCH_TEMPLATE
            .replace("{company}", company)
            .replace("{location}", location);

        let system =
            format!("{RESEARCH_SYSTEM} {NO_FABRICATION_INSTRUCTION} {JSON_ONLY_INSTRUCTION}");
        match self.llm.call_json::<CompanyProfile>(&prompt, &system).await {
            Ok(profile) => Ok(profile),
            Err(e) if e.is_content_error() => {
                tracing::warn!(company, "research returned unusable content: {e}");
                Ok(CompanyProfile::default())
            }
            Err(e) => Err(PipelineError::Llm(format!("research failed: {e}"))),
        }
    }
}

/// Research stand-in for disabled configuration and tests: always finds
/// nothing, never fails.
pub struct NoopResearcher;

#[async_trait]
impl CompanyResearcher for NoopResearcher {
    async fn research(
        &self,
        _company: &str,
        _location: &str,
    ) -> Result<CompanyProfile, PipelineError> {
        Ok(CompanyProfile::default())
    }
}
