//! Single-flight guard for long-running cache operations

use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tracing::debug;

/// Outcome shared by every caller of one operation
pub type SharedOutcome = Shared<BoxFuture<'static, Result<(), String>>>;

/// Operations the cache runs at most once at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Initialize,
    Reload,
}

/// Registry of operations currently running, keyed by kind
///
/// The first caller for a key spawns the operation; callers arriving while
/// it runs get a clone of the same [`SharedOutcome`]. The entry disappears
/// when the operation settles, so the next caller starts a fresh one.
/// Operations run on their own task and keep going if every caller drops
/// its outcome.
pub struct InFlight<K> {
    pending: Arc<Mutex<HashMap<K, SharedOutcome>>>,
}

impl<K> Default for InFlight<K> {
    fn default() -> Self {
        Self {
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

fn lock<K>(pending: &Mutex<HashMap<K, SharedOutcome>>) -> MutexGuard<'_, HashMap<K, SharedOutcome>> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<K> InFlight<K>
where
    K: Eq + Hash + Clone + Debug + Send + 'static,
{
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the running operation for `key`, or start it with `start`
    pub fn join_or_start<F, Fut>(&self, key: K, start: F) -> SharedOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), String>> + Send + 'static,
    {
        let mut pending = lock(&self.pending);
        if let Some(existing) = pending.get(&key) {
            debug!(?key, "InFlight::join_or_start: joining running operation");
            return existing.clone();
        }

        debug!(?key, "InFlight::join_or_start: starting operation");
        let registry = Arc::clone(&self.pending);
        let finished_key = key.clone();
        let operation = start();
        let task = tokio::spawn(async move {
            let outcome = operation.await;
            lock(&registry).remove(&finished_key);
            outcome
        });

        let outcome = async move {
            task.await
                .unwrap_or_else(|e| Err(format!("Operation did not finish: {e}")))
        }
        .boxed()
        .shared();
        pending.insert(key, outcome.clone());
        outcome
    }

    /// Outcome of the running operation for `key`, if any
    pub fn current(&self, key: &K) -> Option<SharedOutcome> {
        lock(&self.pending).get(key).cloned()
    }

    /// Check if an operation for `key` is running
    pub fn is_pending(&self, key: &K) -> bool {
        lock(&self.pending).contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_second_caller_joins_first() {
        let guard: InFlight<Operation> = InFlight::new();
        let starts = Arc::new(AtomicUsize::new(0));
        let (release_tx, release_rx) = oneshot::channel::<()>();

        let counter = Arc::clone(&starts);
        let first = guard.join_or_start(Operation::Initialize, move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            let _ = release_rx.await;
            Ok(())
        });

        let counter = Arc::clone(&starts);
        let second = guard.join_or_start(Operation::Initialize, move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        assert!(guard.is_pending(&Operation::Initialize));

        release_tx.send(()).unwrap();
        assert_eq!(first.await, Ok(()));
        assert_eq!(second.await, Ok(()));
        assert_eq!(starts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_entry_removed_after_settling() {
        let guard: InFlight<Operation> = InFlight::new();

        let outcome = guard.join_or_start(Operation::Initialize, || async { Err("boom".to_string()) });
        assert_eq!(outcome.await, Err("boom".to_string()));

        // The spawned task removes its entry before the outcome resolves
        assert!(!guard.is_pending(&Operation::Initialize));
        assert!(guard.current(&Operation::Initialize).is_none());

        let outcome = guard.join_or_start(Operation::Initialize, || async { Ok(()) });
        assert_eq!(outcome.await, Ok(()));
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let guard: InFlight<Operation> = InFlight::new();
        let (release_tx, release_rx) = oneshot::channel::<()>();

        let init = guard.join_or_start(Operation::Initialize, move || async move {
            let _ = release_rx.await;
            Ok(())
        });
        let reload = guard.join_or_start(Operation::Reload, || async { Err("reload".to_string()) });

        assert_eq!(reload.await, Err("reload".to_string()));
        assert!(guard.is_pending(&Operation::Initialize));

        release_tx.send(()).unwrap();
        assert_eq!(init.await, Ok(()));
    }

    #[tokio::test]
    async fn test_operation_survives_dropped_outcome() {
        let guard: InFlight<Operation> = InFlight::new();
        let (done_tx, done_rx) = oneshot::channel::<()>();

        drop(guard.join_or_start(Operation::Initialize, move || async move {
            let _ = done_tx.send(());
            Ok(())
        }));

        assert!(done_rx.await.is_ok());
    }
}
