//! StageRunner — bounded retry with structured failure capture.
//!
//! This is the single place where a stage function's errors become record
//! annotations. A stage function may fail; the runner retries it up to the
//! policy's attempt budget, and when the budget is spent it degrades the
//! input into the stage's output type instead of raising. Nothing escapes.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::pipeline::records::{DegradeFrom, StageAnnotation};

/// Retry policy for one stage. `max_retries` is the total attempt count.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    /// Base delay for exponential spacing between attempts; `None` retries
    /// immediately. Network-bound stages should always set this.
    pub backoff: Option<Duration>,
}

impl RetryPolicy {
    /// Policy for network-bound stages: exponential spacing from 500ms.
    pub fn network(max_retries: u32) -> Self {
        Self {
            max_retries: max_retries.max(1),
            backoff: Some(Duration::from_millis(500)),
        }
    }

    /// Policy for cheap stages where spacing buys nothing.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries: max_retries.max(1),
            backoff: None,
        }
    }

    fn delay_before(&self, attempt: u32) -> Option<Duration> {
        // attempt is 1-based; no delay before the first attempt.
        let base = self.backoff?;
        if attempt <= 1 {
            return None;
        }
        Some(base * (1 << (attempt - 2).min(8)))
    }
}

/// Runs `stage_fn` under `policy`. On success returns the stage output; on
/// exhaustion returns `O::degraded(input, annotation)` — the caller decides
/// downstream whether the degraded record proceeds or is skipped.
pub async fn run_stage<I, O, F, Fut, E>(
    stage: &str,
    policy: &RetryPolicy,
    input: I,
    stage_fn: F,
) -> O
where
    I: Clone,
    O: DegradeFrom<I>,
    F: Fn(I) -> Fut,
    Fut: Future<Output = Result<O, E>>,
    E: std::fmt::Display,
{
    let mut last_error = String::new();

    for attempt in 1..=policy.max_retries {
        if let Some(delay) = policy.delay_before(attempt) {
            tokio::time::sleep(delay).await;
        }

        match stage_fn(input.clone()).await {
            Ok(output) => return output,
            Err(e) => {
                last_error = e.to_string();
                warn!(
                    stage,
                    attempt,
                    max = policy.max_retries,
                    "stage attempt failed: {last_error}"
                );
            }
        }
    }

    warn!(stage, "retries exhausted, degrading record");
    O::degraded(input, StageAnnotation::error(stage, last_error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::company::CompanyGroup;
    use crate::pipeline::records::{ParsedCompany, StageOutcome};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn group() -> CompanyGroup {
        CompanyGroup {
            name: "Acme".to_string(),
            postings: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_success_on_first_attempt_passes_through() {
        let out: ParsedCompany = run_stage(
            "parse",
            &RetryPolicy::immediate(3),
            group(),
            |g| async move {
                Ok::<_, String>(ParsedCompany {
                    group: g,
                    enrichments: Vec::new(),
                    annotations: Vec::new(),
                })
            },
        )
        .await;
        assert!(out.annotations.is_empty());
    }

    #[tokio::test]
    async fn test_exhaustion_makes_exactly_max_retries_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let out: ParsedCompany = run_stage(
            "parse",
            &RetryPolicy::immediate(3),
            group(),
            move |_g| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<ParsedCompany, _>("always broken".to_string())
                }
            },
        )
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3, "exactly 3 attempts");
        assert_eq!(out.annotations.len(), 1);
        assert_eq!(out.annotations[0].stage, "parse");
        assert_eq!(out.annotations[0].status, StageOutcome::Error);
        assert_eq!(out.annotations[0].error.as_deref(), Some("always broken"));
    }

    #[tokio::test]
    async fn test_recovery_on_second_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let out: ParsedCompany = run_stage(
            "parse",
            &RetryPolicy::immediate(3),
            group(),
            move |g| {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err("transient".to_string())
                    } else {
                        Ok(ParsedCompany {
                            group: g,
                            enrichments: Vec::new(),
                            annotations: Vec::new(),
                        })
                    }
                }
            },
        )
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(out.annotations.is_empty(), "recovered run carries no annotation");
    }

    #[test]
    fn test_backoff_spacing_doubles() {
        let policy = RetryPolicy::network(4);
        assert_eq!(policy.delay_before(1), None);
        assert_eq!(policy.delay_before(2), Some(Duration::from_millis(500)));
        assert_eq!(policy.delay_before(3), Some(Duration::from_millis(1000)));
        assert_eq!(policy.delay_before(4), Some(Duration::from_millis(2000)));
    }

    #[test]
    fn test_policies_never_allow_zero_attempts() {
        assert_eq!(RetryPolicy::immediate(0).max_retries, 1);
        assert_eq!(RetryPolicy::network(0).max_retries, 1);
    }
}
