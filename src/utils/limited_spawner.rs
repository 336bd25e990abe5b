use std::future::Future;
use std::sync::Arc;
use tokio::sync::{AcquireError, Semaphore};
use tokio::task::JoinHandle;

/// Spawns tokio tasks while keeping at most `max_concurrent` of them alive.
///
/// `spawn` waits for a free slot before the task starts, so callers that
/// submit in a loop queue up behind running work in submission order.
pub struct LimitedSpawner {
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
}

impl LimitedSpawner {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Number of tasks currently holding a slot.
    #[cfg(test)]
    pub fn in_flight(&self) -> usize {
        self.max_concurrent - self.semaphore.available_permits()
    }

    pub async fn spawn<F>(&self, f: F) -> Result<JoinHandle<F::Output>, AcquireError>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let permit = Arc::clone(&self.semaphore).acquire_owned().await?;
        Ok(tokio::spawn(async move {
            // released on completion or panic
            let _permit = permit;
            f.await
        }))
    }
}
