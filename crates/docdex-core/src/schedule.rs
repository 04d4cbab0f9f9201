//! Delayed one-shot retry tasks

use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::trace;

/// Keyed one-shot tasks that fire after a delay.
///
/// Scheduling under an existing key replaces (cancels) the pending task; a
/// task removes its own key when it fires. Everything still pending can be
/// swept with [`cancel_all`](Self::cancel_all), which a refresh does before
/// rebuilding.
#[derive(Debug)]
pub struct RetryScheduler {
    tasks: Arc<DashMap<String, JoinHandle<()>>>,
}

impl RetryScheduler {
    /// Create an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tasks: Arc::new(DashMap::new()),
        }
    }

    /// Run `task` after `delay`, keyed by `key`.
    pub fn schedule_in<F>(&self, key: &str, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel(key);
        let tasks = Arc::clone(&self.tasks);
        let owner = key.to_owned();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tasks.remove(&owner);
            task.await;
        });
        self.tasks.insert(key.to_owned(), handle);
        trace!(key, delay_secs = delay.as_secs(), "one-shot task scheduled");
    }

    /// Abort the pending task under `key`, if any.
    pub fn cancel(&self, key: &str) -> bool {
        match self.tasks.remove(key) {
            Some((_, handle)) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Abort every pending task.
    pub fn cancel_all(&self) {
        self.tasks.retain(|_, handle| {
            handle.abort();
            false
        });
    }

    /// Whether a task is still pending under `key`.
    #[must_use]
    pub fn is_scheduled(&self, key: &str) -> bool {
        self.tasks.contains_key(key)
    }
}

impl Default for RetryScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RetryScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fires_after_delay() {
        let scheduler = RetryScheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&fired);
        scheduler.schedule_in("pkg", Duration::from_secs(60), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(scheduler.is_scheduled("pkg"));
        // Let the spawned task register its timer against the paused clock at
        // t=0 before we advance it; otherwise its deadline is computed only on
        // first poll, after the advance.
        settle().await;

        tokio::time::advance(Duration::from_secs(59)).await;
        settle().await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::advance(Duration::from_secs(2)).await;
        settle().await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!scheduler.is_scheduled("pkg"));
    }

    #[tokio::test(start_paused = true)]
    async fn rescheduling_replaces_the_pending_task() {
        let scheduler = RetryScheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let counter = Arc::clone(&fired);
            scheduler.schedule_in("pkg", Duration::from_secs(60), async move {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        // Let the surviving spawned task register its timer at t=0 before the
        // paused clock is advanced (see `fires_after_delay`).
        settle().await;

        tokio::time::advance(Duration::from_secs(61)).await;
        settle().await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_all_sweeps_pending_tasks() {
        let scheduler = RetryScheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        for key in ["a", "b"] {
            let counter = Arc::clone(&fired);
            scheduler.schedule_in(key, Duration::from_secs(60), async move {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        scheduler.cancel_all();
        assert!(!scheduler.is_scheduled("a"));

        tokio::time::advance(Duration::from_secs(120)).await;
        settle().await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
