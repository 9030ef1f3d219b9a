use thiserror::Error;

/// Error type shared by the pipeline's collaborators.
///
/// Stage failures never cross a stage boundary as errors — the StageRunner
/// converts them into annotations on the flowing record. This type exists
/// for the collaborators themselves (scraper, LLM parser, store) and for
/// startup wiring.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Scrape error: {0}")]
    Scrape(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
