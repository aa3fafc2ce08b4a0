//! Delayed, coalescing background work.
//!
//! `DeferredTaskQueue` runs a task once a delay has elapsed. Scheduling a key
//! that already has a pending task does not start another one: the trigger's
//! item is appended to the pending batch, and the task receives the whole
//! batch when it runs. Every task runs under a timeout, and `shutdown` cancels
//! whatever is still waiting. Nothing here is durable: work lost to a restart
//! is simply not done.
//!
//! Fire-and-forget work (emails) goes through [`DeferredTaskQueue::spawn`] so
//! that shutdown waits for it on the same tracker.

use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

use crate::common::GroupId;

/// Keyed by `K`; each trigger contributes one `T` to the pending batch
pub struct DeferredTaskQueue<K = GroupId, T = String> {
    pending: Arc<Mutex<HashMap<K, Vec<T>>>>,
    tracker: TaskTracker,
    shutdown: CancellationToken,
    timeout: Duration,
}

impl<K, T> Clone for DeferredTaskQueue<K, T> {
    fn clone(&self) -> Self {
        Self {
            pending: self.pending.clone(),
            tracker: self.tracker.clone(),
            shutdown: self.shutdown.clone(),
            timeout: self.timeout,
        }
    }
}

impl<K, T> DeferredTaskQueue<K, T>
where
    K: Hash + Eq + Clone + Debug + Send + Sync + 'static,
    T: Send + 'static,
{
    pub fn new(timeout: Duration) -> Self {
        Self {
            pending: Arc::new(Mutex::new(HashMap::new())),
            tracker: TaskTracker::new(),
            shutdown: CancellationToken::new(),
            timeout,
        }
    }

    /// Run `task` after `delay` unless a task for `key` is already waiting.
    ///
    /// Returns `true` if a new task was scheduled, `false` if `item` joined the
    /// pending batch instead. The batch is taken just before the task runs, so
    /// a trigger that arrives mid-run schedules a fresh pass with its own item.
    pub async fn schedule<F, Fut>(&self, key: K, item: T, delay: Duration, task: F) -> bool
    where
        F: FnOnce(Vec<T>) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        if self.shutdown.is_cancelled() {
            debug!(?key, "Queue shut down, dropping deferred task");
            return false;
        }

        {
            let mut pending = self.pending.lock().await;
            if let Some(batch) = pending.get_mut(&key) {
                batch.push(item);
                debug!(?key, batch = batch.len(), "Deferred task already pending, coalescing");
                return false;
            }
            pending.insert(key.clone(), vec![item]);
        }

        let pending = self.pending.clone();
        let shutdown = self.shutdown.clone();
        let timeout = self.timeout;

        self.tracker.spawn(async move {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!(?key, "Deferred task cancelled before it ran");
                    pending.lock().await.remove(&key);
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }

            let batch = pending.lock().await.remove(&key).unwrap_or_default();

            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!(?key, "Deferred task cancelled while running");
                }
                result = tokio::time::timeout(timeout, task(batch)) => match result {
                    Ok(Ok(())) => debug!(?key, "Deferred task finished"),
                    Ok(Err(e)) => warn!(?key, error = %e, "Deferred task failed"),
                    Err(_) => warn!(?key, timeout_secs = timeout.as_secs(), "Deferred task timed out"),
                },
            }
        });

        true
    }

    /// Whether a task for `key` is scheduled and has not started yet
    pub async fn is_pending(&self, key: &K) -> bool {
        self.pending.lock().await.contains_key(key)
    }

    /// Run a fire-and-forget future on the queue's tracker
    pub fn spawn<Fut>(&self, task: Fut)
    where
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.tracker.spawn(task);
    }

    /// Cancel pending work and wait for in-flight tasks to wind down
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        self.tracker.close();
        self.tracker.wait().await;
    }

    /// Whether `shutdown` has been called
    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Token cancelled on shutdown, for long-running loops sharing the tracker
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }
}
