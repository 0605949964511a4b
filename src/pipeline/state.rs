//! Per-item pipeline state machine.
//!
//! ```text
//! Pending -> Resolving -> Fetching -> Enriching -> Done
//!    |           |            |           |
//!    v           v            v           v
//! Skipped   Failed(resolve) Failed(fetch) Failed(enrich)
//! ```
//!
//! The state lives in a [`StateCell`] shared between the pipeline and the
//! pool, so the pool can still name the stage an item was in if its task
//! panics.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

use crate::model::Stage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Pending,
    Resolving,
    Fetching,
    Enriching,
    Done,
    Skipped,
    Failed(Stage),
}

impl PipelineState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PipelineState::Done | PipelineState::Skipped | PipelineState::Failed(_)
        )
    }

    /// The stage this state belongs to, if any.
    pub fn stage(self) -> Option<Stage> {
        match self {
            PipelineState::Resolving => Some(Stage::Resolve),
            PipelineState::Fetching => Some(Stage::Fetch),
            PipelineState::Enriching => Some(Stage::Enrich),
            PipelineState::Failed(stage) => Some(stage),
            _ => None,
        }
    }

    /// Whether `next` may directly follow `self`.
    pub fn can_transition_to(self, next: PipelineState) -> bool {
        use PipelineState::*;
        matches!(
            (self, next),
            (Pending, Resolving)
                | (Pending, Skipped)
                | (Resolving, Fetching)
                | (Resolving, Failed(Stage::Resolve))
                | (Fetching, Enriching)
                | (Fetching, Failed(Stage::Fetch))
                | (Enriching, Done)
                | (Enriching, Failed(Stage::Enrich))
        )
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Pending => write!(f, "pending"),
            PipelineState::Resolving => write!(f, "resolving"),
            PipelineState::Fetching => write!(f, "fetching"),
            PipelineState::Enriching => write!(f, "enriching"),
            PipelineState::Done => write!(f, "done"),
            PipelineState::Skipped => write!(f, "skipped"),
            PipelineState::Failed(stage) => write!(f, "failed({})", stage),
        }
    }
}

#[derive(Debug)]
struct Inner {
    history: Vec<PipelineState>,
    last_stage: Option<Stage>,
}

/// Shared, observable state of one item's pipeline.
#[derive(Debug, Clone)]
pub struct StateCell(Arc<Mutex<Inner>>);

impl Default for StateCell {
    fn default() -> Self {
        Self(Arc::new(Mutex::new(Inner {
            history: vec![PipelineState::Pending],
            last_stage: None,
        })))
    }
}

impl StateCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> PipelineState {
        let inner = self.0.lock();
        inner
            .history
            .last()
            .copied()
            .unwrap_or(PipelineState::Pending)
    }

    /// Last stage the pipeline entered; `Resolve` if it never started.
    pub fn last_stage(&self) -> Stage {
        self.0.lock().last_stage.unwrap_or(Stage::Resolve)
    }

    /// Every state visited so far, starting with `Pending`.
    pub fn history(&self) -> Vec<PipelineState> {
        self.0.lock().history.clone()
    }

    /// Move to `next`. Out-of-order transitions are a bug in the pipeline.
    pub(crate) fn advance(&self, next: PipelineState, item: &str) {
        let mut inner = self.0.lock();
        let current = inner
            .history
            .last()
            .copied()
            .unwrap_or(PipelineState::Pending);
        debug_assert!(
            current.can_transition_to(next),
            "invalid transition {} -> {}",
            current,
            next
        );

        tracing::debug!(item = %item, "{} -> {}", current, next);
        if let Some(stage) = next.stage() {
            inner.last_stage = Some(stage);
        }
        inner.history.push(next);
    }
}
