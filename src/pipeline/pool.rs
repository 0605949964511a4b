//! Bounded concurrent execution of item pipelines.
//!
//! A semaphore permit is acquired *before* each task is spawned, so at most
//! `concurrency` tasks exist at any time no matter how large the batch is.
//! Each task owns its permit and releases it when the pipeline finishes.
//!
//! Every item ends with exactly one [`Outcome`]:
//! - the pipeline's own result,
//! - `Failed(stage)` when its task panicked, `stage` being the last one it entered,
//! - `Skipped` when dispatch was aborted before the item started.

use chrono::Utc;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{Id, JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

use super::naming::assign_names;
use super::state::StateCell;
use super::ItemPipeline;
use crate::model::{BatchReport, Item, ItemOutcome, Outcome};

/// Default number of items processed at once.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Runs [`ItemPipeline`]s over a batch with a fixed concurrency ceiling.
pub struct WorkerPool {
    pipeline: Arc<ItemPipeline>,
    concurrency: usize,
    abort: CancellationToken,
}

/// Bookkeeping for one dispatched task.
struct Dispatched {
    index: usize,
    state: StateCell,
}

impl WorkerPool {
    /// A `concurrency` of 0 is treated as 1.
    pub fn new(pipeline: ItemPipeline, concurrency: usize) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            concurrency: concurrency.max(1),
            abort: CancellationToken::new(),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Token that stops further dispatch when cancelled.
    ///
    /// Pipelines already running are left to finish.
    pub fn abort_handle(&self) -> CancellationToken {
        self.abort.clone()
    }

    /// Run every item and collect one outcome per item, in input order.
    pub async fn run_batch(&self, items: Vec<Item>) -> BatchReport {
        let started_at = Utc::now();
        let names = assign_names(&items);
        let semaphore = Arc::new(Semaphore::new(self.concurrency));

        let mut outcomes: Vec<Option<Outcome>> = vec![None; items.len()];
        let mut dispatched: HashMap<Id, Dispatched> = HashMap::new();
        let mut tasks = JoinSet::new();

        tracing::info!(
            "Processing {} items with {} workers",
            items.len(),
            self.concurrency
        );

        for (index, (item, name)) in items.iter().zip(names).enumerate() {
            let permit = tokio::select! {
                biased;
                _ = self.abort.cancelled() => {
                    tracing::warn!("Dispatch aborted, {} items not started", items.len() - index);
                    break;
                }
                permit = semaphore.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            // Collect whatever finished while we waited for the permit
            while let Some(result) = tasks.try_join_next_with_id() {
                self.record(result, &items, &mut dispatched, &mut outcomes);
            }

            let state = StateCell::new();
            let pipeline = self.pipeline.clone();
            let item = item.clone();
            let task_state = state.clone();
            let handle = tasks.spawn(async move {
                let _permit = permit;
                pipeline.run(&item, &name, &task_state).await
            });
            dispatched.insert(handle.id(), Dispatched { index, state });
        }

        while let Some(result) = tasks.join_next_with_id().await {
            self.record(result, &items, &mut dispatched, &mut outcomes);
        }

        let outcomes = items
            .iter()
            .zip(outcomes)
            .map(|(item, outcome)| ItemOutcome {
                item: item.to_string(),
                outcome: outcome.unwrap_or_else(|| Outcome::skipped("dispatch aborted")),
            })
            .collect();

        let report = BatchReport::new(started_at, outcomes);
        tracing::info!(
            "Batch finished: {} succeeded, {} failed, {} skipped",
            report.succeeded_count(),
            report.failed_count(),
            report.skipped_count()
        );
        report
    }

    fn record(
        &self,
        result: Result<(Id, Outcome), JoinError>,
        items: &[Item],
        dispatched: &mut HashMap<Id, Dispatched>,
        outcomes: &mut [Option<Outcome>],
    ) {
        let (id, outcome) = match result {
            Ok((id, outcome)) => (id, Ok(outcome)),
            Err(e) => (e.id(), Err(e)),
        };
        let Some(Dispatched { index, state }) = dispatched.remove(&id) else {
            tracing::error!("Finished task {} was never dispatched", id);
            return;
        };
        let item = &items[index];

        let outcome = outcome.unwrap_or_else(|e| {
            let stage = state.last_stage();
            let reason = if e.is_panic() {
                format!("pipeline panicked: {}", panic_message(e.into_panic()))
            } else {
                "pipeline task was cancelled".to_string()
            };
            tracing::error!("{} crashed during {}: {}", item, stage, reason);
            Outcome::failed(stage, reason)
        });

        match &outcome {
            Outcome::Succeeded { warnings, .. } if warnings.is_empty() => {
                tracing::info!("Downloaded and updated metadata for: {}", item)
            }
            Outcome::Succeeded { warnings, .. } => tracing::info!(
                "Downloaded {} with {} warning(s)",
                item,
                warnings.len()
            ),
            Outcome::Skipped { reason } => tracing::info!("Skipped {}: {}", item, reason),
            Outcome::Failed { stage, reason } => {
                tracing::error!("Failed {} at {}: {}", item, stage, reason)
            }
        }

        outcomes[index] = Some(outcome);
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::traits::mocks::MockEnricher;
    use crate::fetch::mocks::MockFetcher;
    use crate::model::Stage;
    use crate::pipeline::RetryPolicy;
    use crate::resolve::mocks::MockResolver;
    use crate::test_utils::mock_item;
    use std::path::Path;
    use std::sync::atomic::Ordering;
    use std::time::Duration;
    use tempfile::tempdir;

    fn items_in(dir: &Path, titles: &[&str]) -> Vec<Item> {
        titles
            .iter()
            .map(|t| Item {
                target_dir: dir.to_path_buf(),
                ..mock_item(t)
            })
            .collect()
    }

    fn pool(
        resolver: MockResolver,
        fetcher: Arc<MockFetcher>,
        concurrency: usize,
    ) -> WorkerPool {
        let pipeline = ItemPipeline::new(
            Arc::new(resolver),
            fetcher,
            Arc::new(MockEnricher::new()),
        )
        .with_retry(RetryPolicy::new(3, Duration::from_secs(5)));
        WorkerPool::new(pipeline, concurrency)
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_to_end_scenario() {
        let dir = tempdir().unwrap();
        let fetcher = Arc::new(MockFetcher::new().flaky("C", 2));
        let pool = pool(MockResolver::new().missing("B"), fetcher.clone(), 5);

        let report = pool.run_batch(items_in(dir.path(), &["A", "B", "C"])).await;

        assert_eq!(
            report.succeeded(),
            vec!["Test Artist - A", "Test Artist - C"]
        );
        let failures = report.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].item, "Test Artist - B");
        assert_eq!(failures[0].stage, Stage::Resolve);
        assert_eq!(report.skipped_count(), 0);
        // A once, C three times, B never
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrency_bound() {
        let dir = tempdir().unwrap();
        let fetcher = Arc::new(MockFetcher::new().with_delay(Duration::from_secs(1)));
        let pool = pool(MockResolver::new(), fetcher.clone(), 3);

        let titles: Vec<String> = (0..12).map(|i| format!("Track {}", i)).collect();
        let titles: Vec<&str> = titles.iter().map(String::as_str).collect();
        let report = pool.run_batch(items_in(dir.path(), &titles)).await;

        assert_eq!(report.succeeded_count(), 12);
        assert_eq!(fetcher.max_in_flight.load(Ordering::SeqCst), 3);
        assert_eq!(fetcher.in_flight.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_not_found_does_not_affect_others() {
        let dir = tempdir().unwrap();
        let pool = pool(
            MockResolver::new().missing("Track 3"),
            Arc::new(MockFetcher::new()),
            2,
        );

        let titles = ["Track 1", "Track 2", "Track 3", "Track 4", "Track 5"];
        let report = pool.run_batch(items_in(dir.path(), &titles)).await;

        assert_eq!(report.total(), 5);
        assert_eq!(report.succeeded_count(), 4);
        for entry in &report.outcomes {
            if entry.item.ends_with("Track 3") {
                assert!(matches!(entry.outcome, Outcome::Failed { stage: Stage::Resolve, .. }));
            } else {
                assert!(entry.outcome.is_success(), "{} did not succeed", entry.item);
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_panic_is_contained() {
        let dir = tempdir().unwrap();
        let fetcher = Arc::new(MockFetcher::new().panics_on("B"));
        let pool = pool(MockResolver::new(), fetcher.clone(), 2);

        let report = pool.run_batch(items_in(dir.path(), &["A", "B", "C"])).await;

        assert_eq!(report.succeeded(), vec!["Test Artist - A", "Test Artist - C"]);
        let failures = report.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].stage, Stage::Fetch);
        assert!(failures[0].reason.contains("fetcher blew up on B"));
        assert_eq!(fetcher.in_flight.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_outcomes_follow_input_order() {
        let dir = tempdir().unwrap();
        let pool = pool(
            MockResolver::new(),
            Arc::new(MockFetcher::new().with_delay(Duration::from_millis(10))),
            4,
        );
        let titles = ["Z", "Y", "X", "W", "V", "U"];

        let report = pool.run_batch(items_in(dir.path(), &titles)).await;

        let order: Vec<&str> = report.outcomes.iter().map(|o| o.item.as_str()).collect();
        let expected: Vec<String> = titles.iter().map(|t| format!("Test Artist - {}", t)).collect();
        assert_eq!(order, expected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_titles_get_distinct_files() {
        let dir = tempdir().unwrap();
        let pool = pool(MockResolver::new(), Arc::new(MockFetcher::new()), 3);

        let report = pool
            .run_batch(items_in(dir.path(), &["Intro", "Intro", "intro"]))
            .await;

        let paths: Vec<_> = report
            .outcomes
            .iter()
            .map(|o| match &o.outcome {
                Outcome::Succeeded { path, .. } => path.clone(),
                other => panic!("unexpected outcome {:?}", other),
            })
            .collect();
        assert_eq!(
            paths,
            vec![
                dir.path().join("Intro.mp3"),
                dir.path().join("Intro (2).mp3"),
                dir.path().join("intro (3).mp3"),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_abort_before_start_skips_everything() {
        let dir = tempdir().unwrap();
        let fetcher = Arc::new(MockFetcher::new());
        let pool = pool(MockResolver::new(), fetcher.clone(), 2);
        pool.abort_handle().cancel();

        let report = pool.run_batch(items_in(dir.path(), &["A", "B"])).await;

        assert_eq!(report.total(), 2);
        assert_eq!(report.skipped_count(), 2);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abort_mid_batch_lets_running_items_finish() {
        let dir = tempdir().unwrap();
        let fetcher = Arc::new(MockFetcher::new().with_delay(Duration::from_secs(10)));
        let pool = pool(MockResolver::new(), fetcher.clone(), 1);

        let abort = pool.abort_handle();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(15)).await;
            abort.cancel();
        });

        let report = pool
            .run_batch(items_in(dir.path(), &["A", "B", "C", "D"]))
            .await;

        assert_eq!(report.total(), 4);
        assert_eq!(report.succeeded(), vec!["Test Artist - A", "Test Artist - B"]);
        assert_eq!(report.skipped_count(), 2);
        assert!(report.outcomes[2..]
            .iter()
            .all(|o| o.outcome == Outcome::skipped("dispatch aborted")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_batch() {
        let pool = pool(MockResolver::new(), Arc::new(MockFetcher::new()), 5);
        let report = pool.run_batch(Vec::new()).await;
        assert_eq!(report.total(), 0);
    }

    #[test]
    fn test_zero_concurrency_is_clamped() {
        let pool = pool(MockResolver::new(), Arc::new(MockFetcher::new()), 0);
        assert_eq!(pool.concurrency(), 1);
    }

    #[test]
    fn test_panic_message_payloads() {
        assert_eq!(panic_message(Box::new("static")), "static");
        assert_eq!(panic_message(Box::new(String::from("owned"))), "owned");
        assert_eq!(panic_message(Box::new(42)), "unknown panic payload");
    }
}
