// LLM-backed enrichment collaborators.
// All API calls go through llm_client — no direct Anthropic calls here.

pub mod parser;
pub mod prompts;
pub mod research;
