//! The per-item pipeline and the worker pool that runs it over a batch.
//!
//! # Architecture
//!
//! - **Retry** (`retry.rs`) - Fixed-delay retrier for transient errors
//! - **Naming** (`naming.rs`) - Unique output filenames, assigned before dispatch
//! - **State** (`state.rs`) - Per-item state machine, observable from the pool
//! - **Pool** (`pool.rs`) - Bounded concurrent execution and the batch report
//!
//! An item runs resolve, fetch and enrich strictly in that order. Every
//! stage failure ends the item with `Failed(stage)`; nothing escapes the
//! item's own task.

pub mod naming;
pub mod pool;
pub mod retry;
pub mod state;

pub use pool::WorkerPool;
pub use retry::{RetryError, RetryPolicy, Retryable};
pub use state::{PipelineState, StateCell};

use std::sync::Arc;

use crate::enrichment::Enricher;
use crate::fetch::{ContentFetcher, target_path};
use crate::model::{Item, Outcome, Stage};
use crate::resolve::{SourceResolver, search_query};

/// Injected collaborators and policy shared by every item in a batch.
#[derive(Clone)]
pub struct ItemPipeline {
    resolver: Arc<dyn SourceResolver>,
    fetcher: Arc<dyn ContentFetcher>,
    enricher: Arc<dyn Enricher>,
    retry: RetryPolicy,
    skip_existing: bool,
}

impl ItemPipeline {
    pub fn new(
        resolver: Arc<dyn SourceResolver>,
        fetcher: Arc<dyn ContentFetcher>,
        enricher: Arc<dyn Enricher>,
    ) -> Self {
        Self {
            resolver,
            fetcher,
            enricher,
            retry: RetryPolicy::default(),
            skip_existing: false,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Skip items whose output file is already present.
    pub fn with_skip_existing(mut self, skip_existing: bool) -> Self {
        self.skip_existing = skip_existing;
        self
    }

    /// Run one item to a terminal state.
    ///
    /// `desired_name` is the file stem assigned by the pool. Progress is
    /// published through `state`.
    pub async fn run(&self, item: &Item, desired_name: &str, state: &StateCell) -> Outcome {
        let label = item.to_string();

        let target = target_path(&item.target_dir, desired_name);
        if self.skip_existing && target.exists() {
            state.advance(PipelineState::Skipped, &label);
            return Outcome::skipped(format!("{} already exists", target.display()));
        }

        state.advance(PipelineState::Resolving, &label);
        let query = search_query(item);
        let locator = match retry::run(self.retry, |_| self.resolver.resolve(&query)).await {
            Ok(locator) => locator,
            Err(e) => return fail(state, &label, Stage::Resolve, e.to_string()),
        };
        tracing::debug!(item = %label, "Resolved to {}", locator);

        state.advance(PipelineState::Fetching, &label);
        let fetched = retry::run(self.retry, |attempt| {
            tracing::debug!(item = %label, "Fetch attempt {}", attempt);
            self.fetcher.fetch(&locator, &item.target_dir, desired_name)
        })
        .await;
        let path = match fetched {
            Ok(path) => path,
            Err(e) => return fail(state, &label, Stage::Fetch, e.to_string()),
        };

        state.advance(PipelineState::Enriching, &label);
        match self.enricher.enrich(&path, item).await {
            Ok(warnings) => {
                state.advance(PipelineState::Done, &label);
                Outcome::Succeeded { path, warnings }
            }
            Err(e) => fail(state, &label, Stage::Enrich, e.to_string()),
        }
    }
}

fn fail(state: &StateCell, label: &str, stage: Stage, reason: String) -> Outcome {
    state.advance(PipelineState::Failed(stage), label);
    Outcome::failed(stage, reason)
}
