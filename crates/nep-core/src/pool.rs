//! Bounded worker pool for per-package work
//!
//! Each item gets its own task; a semaphore bounds how many run at once.
//! Results are sent, tagged with the item's input index, to a single
//! receiver. The receiver is the only place results are combined, so
//! workers never share mutable state.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

/// Result of one work item
#[derive(Debug)]
pub struct Completed<T> {
    /// Position of the item in the submitted list
    pub index: usize,
    /// Worker output
    pub output: T,
}

/// Bounded fan-out executor
#[derive(Debug, Clone)]
pub struct WorkerPool {
    max_workers: usize,
}

impl WorkerPool {
    /// Pool running at most `max_workers` items at once (minimum 1)
    #[inline]
    #[must_use]
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
        }
    }

    /// Pool that runs one item at a time, in submission order
    #[inline]
    #[must_use]
    pub fn sequential() -> Self {
        Self::new(1)
    }

    /// Concurrency bound
    #[inline]
    #[must_use]
    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Start `work` for every item and return the result stream
    ///
    /// The stream closes once every worker has finished. A worker that
    /// panics sends nothing; callers detect the gap from the missing index.
    /// With a bound of 1 items start, and therefore complete, in
    /// submission order.
    pub fn run<I, O, F, Fut>(&self, items: Vec<I>, work: F) -> mpsc::Receiver<Completed<O>>
    where
        I: Send + 'static,
        O: Send + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = O> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(items.len().max(1));
        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let work = Arc::new(work);

        tokio::spawn(async move {
            let mut workers = JoinSet::new();

            for (index, item) in items.into_iter().enumerate() {
                // Acquire before spawning so a bound of 1 keeps input order.
                let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                    break;
                };
                let tx = tx.clone();
                let work = Arc::clone(&work);

                workers.spawn(async move {
                    let output = work(item).await;
                    // The channel has room for every item, so this never waits.
                    let _ = tx.send(Completed { index, output }).await;
                    drop(permit);
                });
            }
            drop(tx);

            while let Some(joined) = workers.join_next().await {
                if let Err(e) = joined {
                    tracing::error!(error = %e, "package worker failed");
                }
            }
        });

        rx
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::sequential()
    }
}
