//! Run progress tracking — per-stage status records plus an observable
//! aggregate for one pipeline run.
//!
//! Each run owns its own `PipelineProgress` handle; there is no process-wide
//! slot, so concurrent runs cannot observe each other's state. Observers are
//! notified with a snapshot taken after the triggering mutation, in mutation
//! order. A panicking observer is logged and ignored — one broken dashboard
//! callback must never abort the pipeline.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::warn;

/// Lifecycle of a single pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Skipped,
}

impl StageStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            StageStatus::Completed | StageStatus::Failed | StageStatus::Skipped
        )
    }
}

/// Status record for one stage. Mutated only through the transition methods
/// below; terminal once completed, failed, or skipped.
#[derive(Debug, Clone, Serialize)]
pub struct StageRecord {
    pub name: String,
    pub description: String,
    pub status: StageStatus,
    /// Fraction of the stage's items processed, in [0, 1].
    pub progress: f64,
    pub current: usize,
    pub total: usize,
    pub message: String,
    pub result: Option<String>,
    pub error: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl StageRecord {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            status: StageStatus::Pending,
            progress: 0.0,
            current: 0,
            total: 0,
            message: String::new(),
            result: None,
            error: None,
            started_at: None,
            finished_at: None,
        }
    }

    fn start(&mut self, total: usize, message: &str) {
        self.status = StageStatus::Running;
        self.total = total;
        self.current = 0;
        self.progress = 0.0;
        self.message = message.to_string();
        self.started_at = Some(Utc::now());
    }

    /// Recomputes progress when the stage has a known item count; a zero
    /// total leaves progress untouched but still updates the message.
    fn update(&mut self, current: usize, message: &str) {
        self.current = current;
        if self.total > 0 {
            self.progress = (current as f64 / self.total as f64).clamp(0.0, 1.0);
        }
        self.message = message.to_string();
    }

    fn complete(&mut self, result: Option<String>, message: &str) {
        self.status = StageStatus::Completed;
        self.progress = 1.0;
        self.message = message.to_string();
        self.result = result;
        self.finished_at = Some(Utc::now());
    }

    /// Failure is data, never a propagated error: downstream bookkeeping
    /// (notifications, report assembly) continues after a stage fails.
    fn fail(&mut self, error: &str) {
        self.status = StageStatus::Failed;
        self.error = Some(error.to_string());
        self.finished_at = Some(Utc::now());
    }

    /// Marks a stage bypassed by an upstream decision without ever running it.
    fn skip(&mut self, reason: &str) {
        self.status = StageStatus::Skipped;
        self.message = reason.to_string();
        self.finished_at = Some(Utc::now());
    }

    /// Wall time spent in the stage so far; `None` if it never started.
    pub fn elapsed(&self) -> Option<Duration> {
        let start = self.started_at?;
        Some(self.finished_at.unwrap_or_else(Utc::now) - start)
    }
}

/// Immutable view handed to observers after every stage transition.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressSnapshot {
    pub started_at: DateTime<Utc>,
    pub stages: Vec<StageRecord>,
    /// Arithmetic mean of stage progress; pending stages contribute 0.
    pub overall_progress: f64,
    /// Remaining-time extrapolation; `None` until some progress exists.
    pub eta_seconds: Option<f64>,
}

type Observer = Arc<dyn Fn(&ProgressSnapshot) + Send + Sync>;

struct ProgressInner {
    started_at: DateTime<Utc>,
    stages: Vec<StageRecord>,
    observers: Vec<Observer>,
}

impl ProgressInner {
    fn overall_progress(&self) -> f64 {
        if self.stages.is_empty() {
            return 0.0;
        }
        self.stages.iter().map(|s| s.progress).sum::<f64>() / self.stages.len() as f64
    }

    fn snapshot(&self) -> ProgressSnapshot {
        let overall = self.overall_progress();
        let elapsed = (Utc::now() - self.started_at).num_milliseconds() as f64 / 1000.0;
        let eta_seconds = if overall > 0.0 {
            Some((elapsed / overall - elapsed).max(0.0))
        } else {
            None
        };
        ProgressSnapshot {
            started_at: self.started_at,
            stages: self.stages.clone(),
            overall_progress: overall,
            eta_seconds,
        }
    }
}

/// Cloneable handle to one run's progress. The orchestrator mutates it;
/// any number of observers (CLI, dashboard sink) read it.
#[derive(Clone)]
pub struct PipelineProgress {
    inner: Arc<Mutex<ProgressInner>>,
}

impl PipelineProgress {
    /// Registers the run's stages up front so overall progress is a mean
    /// over the full stage list from the first notification.
    pub fn new(stages: &[(&str, &str)]) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ProgressInner {
                started_at: Utc::now(),
                stages: stages
                    .iter()
                    .map(|(name, desc)| StageRecord::new(name, desc))
                    .collect(),
                observers: Vec::new(),
            })),
        }
    }

    /// Registers an observer callback. Callbacks run outside the internal
    /// lock, so they may query this handle (`snapshot`, `stage_status`) or
    /// even record further stage updates.
    pub fn on_update(&self, callback: impl Fn(&ProgressSnapshot) + Send + Sync + 'static) {
        self.inner.lock().unwrap().observers.push(Arc::new(callback));
    }

    pub fn stage_start(&self, name: &str, total: usize, message: &str) {
        self.mutate(name, |s| s.start(total, message));
    }

    pub fn stage_update(&self, name: &str, current: usize, message: &str) {
        self.mutate(name, |s| s.update(current, message));
    }

    pub fn stage_complete(&self, name: &str, result: Option<String>, message: &str) {
        self.mutate(name, |s| s.complete(result, message));
    }

    pub fn stage_fail(&self, name: &str, error: &str) {
        self.mutate(name, |s| s.fail(error));
    }

    pub fn stage_skip(&self, name: &str, reason: &str) {
        self.mutate(name, |s| s.skip(reason));
    }

    /// Current snapshot for polling callers.
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.inner.lock().unwrap().snapshot()
    }

    pub fn stage_status(&self, name: &str) -> Option<StageStatus> {
        self.inner
            .lock()
            .unwrap()
            .stages
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.status)
    }

    /// Applies one mutation and notifies observers with the post-mutation
    /// snapshot. The snapshot is taken under the lock, but the lock is
    /// released before callbacks run so an observer may call back into this
    /// handle without deadlocking.
    fn mutate(&self, name: &str, apply: impl FnOnce(&mut StageRecord)) {
        let (snapshot, observers) = {
            let inner = &mut *self.inner.lock().unwrap();
            match inner.stages.iter_mut().find(|s| s.name == name) {
                Some(stage) => apply(stage),
                None => {
                    warn!(stage = name, "progress update for unregistered stage");
                    return;
                }
            }
            (inner.snapshot(), inner.observers.clone())
        };
        for observer in &observers {
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| observer(&snapshot))) {
                warn!("progress observer panicked: {:?}", panic_message(&panic));
            }
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
