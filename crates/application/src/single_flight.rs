//! Single-flight execution of named asynchronous actions.
//!
//! Collapses N concurrent calls under the same key into one execution of
//! the underlying action; every caller observes the same outcome. Only
//! *concurrent* calls are de-duplicated: once an action completes and
//! its waiters are drained, the next call under the key starts a fresh
//! execution.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tokio::sync::oneshot;

/// Callers waiting on a pending action, the initiator included.
type Waiters<T> = Vec<oneshot::Sender<T>>;

/// Pending actions by key.
type PendingMap<T> = HashMap<String, Waiters<T>>;

/// Error produced when the action task died without reporting a result.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SingleFlightError {
    /// The underlying action was torn down before producing an outcome.
    #[error("single-flight action '{0}' aborted before completion")]
    Aborted(String),
}

/// De-duplicates concurrent executions of keyed asynchronous actions.
///
/// The first caller for a key starts the action; callers arriving while
/// it is in flight enqueue themselves and receive the same result.
/// Independent keys run independently and may overlap.
pub struct SingleFlight<T> {
    pending: Arc<Mutex<PendingMap<T>>>,
}

impl<T> SingleFlight<T>
where
    T: Clone + Send + 'static,
{
    /// Creates a coordinator with no pending actions.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Executes `action` under `key`, sharing the outcome with every
    /// caller that joins while it is in flight.
    ///
    /// The first caller for a key spawns the action as a detached task:
    /// dropping any individual caller's future (cancellation) never
    /// cancels the shared run, it only discards that caller's copy of
    /// the result. The waiter-list lock is held for list operations
    /// only, never across the action itself, so an action may call back
    /// into this coordinator under a different key.
    ///
    /// # Errors
    ///
    /// Returns [`SingleFlightError::Aborted`] when the action task was
    /// torn down without broadcasting an outcome.
    pub async fn execute<F, Fut>(&self, key: &str, action: F) -> Result<T, SingleFlightError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();

        let is_initiator = {
            let mut pending = lock_pending(&self.pending);
            match pending.entry(key.to_string()) {
                Entry::Occupied(mut waiters) => {
                    waiters.get_mut().push(sender);
                    false
                }
                Entry::Vacant(slot) => {
                    slot.insert(vec![sender]);
                    true
                }
            }
        };

        if is_initiator {
            let mut guard = DrainGuard {
                pending: Arc::clone(&self.pending),
                key: key.to_string(),
                armed: true,
            };
            let future = action();
            tokio::spawn(async move {
                let result = future.await;
                for waiter in guard.take_waiters() {
                    // A waiter that gave up has dropped its receiver.
                    drop(waiter.send(result.clone()));
                }
            });
        }

        receiver
            .await
            .map_err(|_| SingleFlightError::Aborted(key.to_string()))
    }
}

impl<T> Default for SingleFlight<T>
where
    T: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

fn lock_pending<T>(pending: &Mutex<PendingMap<T>>) -> MutexGuard<'_, PendingMap<T>> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clears the key's pending entry when the action task unwinds without
/// broadcasting. Dropping the senders wakes every receiver with a
/// closed-channel error, which `execute` surfaces as `Aborted`.
struct DrainGuard<T> {
    pending: Arc<Mutex<PendingMap<T>>>,
    key: String,
    armed: bool,
}

impl<T> DrainGuard<T> {
    fn take_waiters(&mut self) -> Waiters<T> {
        self.armed = false;
        lock_pending(&self.pending)
            .remove(&self.key)
            .unwrap_or_default()
    }
}

impl<T> Drop for DrainGuard<T> {
    fn drop(&mut self) {
        if self.armed {
            drop(lock_pending(&self.pending).remove(&self.key));
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::sleep;

    #[tokio::test]
    async fn test_concurrent_callers_share_one_execution() {
        let flight = SingleFlight::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let action = |calls: Arc<AtomicUsize>| {
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                sleep(Duration::from_millis(20)).await;
                "token-1".to_string()
            }
        };

        let (a, b, c) = tokio::join!(
            flight.execute("refresh", action(Arc::clone(&calls))),
            flight.execute("refresh", action(Arc::clone(&calls))),
            flight.execute("refresh", action(Arc::clone(&calls))),
        );

        assert_eq!(a.unwrap(), "token-1");
        assert_eq!(b.unwrap(), "token-1");
        assert_eq!(c.unwrap(), "token-1");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_sequential_calls_execute_again() {
        let flight = SingleFlight::new();
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let calls = Arc::clone(&calls);
            let result = flight
                .execute("refresh", move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    42
                })
                .await;
            assert_eq!(result.unwrap(), 42);
        }

        // No result caching: the second call ran the action again.
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failure_is_broadcast_to_all_waiters() {
        let flight: SingleFlight<Result<String, String>> = SingleFlight::new();

        let action = || {
            move || async move {
                sleep(Duration::from_millis(10)).await;
                Err::<String, String>("renewal rejected".to_string())
            }
        };

        let (a, b) = tokio::join!(
            flight.execute("refresh", action()),
            flight.execute("refresh", action()),
        );

        assert_eq!(a.unwrap(), Err("renewal rejected".to_string()));
        assert_eq!(b.unwrap(), Err("renewal rejected".to_string()));
    }

    #[tokio::test]
    async fn test_independent_keys_overlap() {
        let flight = SingleFlight::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let action = |calls: Arc<AtomicUsize>, value: &'static str| {
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                sleep(Duration::from_millis(10)).await;
                value.to_string()
            }
        };

        let (login, refresh) = tokio::join!(
            flight.execute("login", action(Arc::clone(&calls), "login-token")),
            flight.execute("refresh", action(Arc::clone(&calls), "refresh-token")),
        );

        assert_eq!(login.unwrap(), "login-token");
        assert_eq!(refresh.unwrap(), "refresh-token");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cancelled_caller_leaves_shared_action_running() {
        let flight = Arc::new(SingleFlight::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let initiator = tokio::spawn({
            let flight = Arc::clone(&flight);
            let calls = Arc::clone(&calls);
            async move {
                flight
                    .execute("refresh", move || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        sleep(Duration::from_millis(50)).await;
                        7
                    })
                    .await
            }
        });

        // Let the initiator register and start the action, then drop it.
        sleep(Duration::from_millis(10)).await;
        initiator.abort();

        // A caller joining afterwards still receives the first run's
        // result; no second execution happens.
        let calls_for_join = Arc::clone(&calls);
        let joined = flight
            .execute("refresh", move || async move {
                calls_for_join.fetch_add(1, Ordering::SeqCst);
                99
            })
            .await;

        assert_eq!(joined.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
