use std::future::Future;

use tracing::{debug, error};

use crate::downloader::{DispatchResult, Outcome, WorkItem};
use crate::error::ItemError;
use crate::utils::limited_spawner::LimitedSpawner;

/// Runs `worker` once per item with at most `max_workers` in flight and
/// returns after every item has an outcome. Results keep submission order.
///
/// A worker that panics is recorded as `Failed`; siblings keep running.
pub async fn dispatch<W, Fut>(
    items: Vec<WorkItem>,
    worker: W,
    max_workers: usize,
) -> Vec<DispatchResult>
where
    W: Fn(WorkItem) -> Fut,
    Fut: Future<Output = Outcome> + Send + 'static,
{
    let spawner = LimitedSpawner::new(max_workers);
    debug!(
        items = items.len(),
        workers = spawner.max_concurrent(),
        "Dispatching work items"
    );
    let mut pending = Vec::with_capacity(items.len());
    for item in items {
        let handle = spawner.spawn(worker(item.clone())).await;
        pending.push((item, handle));
    }

    let mut results = Vec::with_capacity(pending.len());
    for (item, handle) in pending {
        let outcome = match handle {
            Ok(handle) => match handle.await {
                Ok(outcome) => outcome,
                Err(err) => {
                    error!(url = %item.source_url, error = %err, "Worker task aborted");
                    Outcome::Failed(ItemError::Join(err.to_string()))
                }
            },
            Err(err) => Outcome::Failed(ItemError::Join(err.to_string())),
        };
        results.push(DispatchResult { item, outcome });
    }
    results
}
