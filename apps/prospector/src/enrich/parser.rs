//! Posting parser collaborator — LLM-backed field extraction.
//!
//! The contract with the pipeline: a posting whose *content* cannot be
//! parsed yields default (empty) enrichment and never an error, so one
//! unparseable posting cannot abort its batch. Only transport-level
//! failures (HTTP, API outage) surface as errors, which the StageRunner
//! then retries.

use async_trait::async_trait;

use crate::enrich::prompts::{POSTING_PARSE_SYSTEM, POSTING_PARSE_TEMPLATE};
use crate::errors::PipelineError;
use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;
use crate::llm_client::LlmClient;
use crate::models::job::{JobPosting, PostingEnrichment};

#[async_trait]
pub trait PostingParser: Send + Sync {
    async fn parse(&self, posting: &JobPosting) -> Result<PostingEnrichment, PipelineError>;
}

pub struct LlmPostingParser {
    llm: LlmClient,
}

impl LlmPostingParser {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl PostingParser for LlmPostingParser {
    async fn parse(&self, posting: &JobPosting) -> Result<PostingEnrichment, PipelineError> {
        let prompt = POSTING_PARSE_TEMPLATE
            .replace("{company}", &posting.company)
            .replace("{title}", &posting.title)
            .replace("{description}", &posting.description);

        let system = format!("{POSTING_PARSE_SYSTEM} {JSON_ONLY_INSTRUCTION}");
        match self
            .llm
            .call_json::<PostingEnrichment>(&prompt, &system)
            .await
        {
            Ok(enrichment) => Ok(enrichment),
            Err(e) if e.is_content_error() => {
                tracing::warn!(url = %posting.url, "unparseable posting, using empty enrichment: {e}");
                Ok(PostingEnrichment::default())
            }
            Err(e) => Err(PipelineError::Llm(format!("posting parse failed: {e}"))),
        }
    }
}
