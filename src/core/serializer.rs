//! Per-account request serialization
//!
//! This module provides the `AccountSerializer` struct, which turns
//! arbitrarily interleaved concurrent submissions into a strictly sequential
//! stream of operations per account, while operations on different accounts
//! run in parallel.
//!
//! # Design
//!
//! Every account that has seen activity owns a *lane*: an unbounded FIFO
//! channel drained by a single worker task. Submitting an operation boxes it
//! together with a oneshot result channel and pushes it onto the account's
//! lane; the worker pops jobs one at a time and runs each to completion before
//! touching the next.
//!
//! ```text
//! submit(1, op_a) ─┐
//! submit(1, op_b) ─┼─▶ lane 1 ─▶ worker 1: op_a, op_b, op_d ...
//! submit(2, op_c) ─┼─▶ lane 2 ─▶ worker 2: op_c ...
//! submit(1, op_d) ─┘
//! ```
//!
//! Lanes live in a `DashMap`. Enqueueing only holds the account's shard guard
//! for the lookup and the channel send, never while an operation executes,
//! so there is no global lock on the submission path.
//!
//! # Ordering
//!
//! `submit` is a plain synchronous call that enqueues before it returns the
//! future. If one `submit` for an account returns before another is issued,
//! the first operation completes before the second starts. Dropping the
//! returned future does not dequeue the operation: it still runs in its slot.
//!
//! # Failure Isolation
//!
//! An operation's error goes to its own caller only. A panicking operation is
//! caught on the worker, its caller receives [`LedgerError::TaskAborted`], and
//! the lane carries on with the next job.
//!
//! # Idle Eviction
//!
//! By default lanes are kept for the life of the serializer. With
//! [`AccountSerializer::with_idle_eviction`], a worker that has been idle for
//! the configured duration removes its own lane, but only while holding the
//! shard guard and only if its queue is empty. Since senders also enqueue under
//! that guard, eviction can never race with a new submission for the account.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use dashmap::DashMap;
use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use tokio::sync::{mpsc, oneshot};

use crate::types::{AccountId, LedgerError};

/// A queued unit of work, already wired to deliver its result
type Job = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

/// Map of live lanes, shared with the workers for self-eviction
type LaneMap = DashMap<AccountId, Lane>;

/// Submission end of one account's queue
#[derive(Debug)]
struct Lane {
    /// Distinguishes this lane from any later lane for the same account
    id: u64,
    sender: mpsc::UnboundedSender<Job>,
}

/// Serializes operations per account
///
/// Must be used from within a tokio runtime: the first submission for an
/// account spawns that account's worker task.
#[derive(Debug)]
pub struct AccountSerializer {
    lanes: Arc<LaneMap>,
    next_lane_id: AtomicU64,
    idle_eviction: Option<Duration>,
}

impl AccountSerializer {
    /// Create a serializer whose lanes live as long as it does
    pub fn new() -> Self {
        Self {
            lanes: Arc::new(DashMap::new()),
            next_lane_id: AtomicU64::new(0),
            idle_eviction: None,
        }
    }

    /// Create a serializer whose lanes are dropped after `idle` without work
    pub fn with_idle_eviction(idle: Duration) -> Self {
        Self {
            idle_eviction: Some(idle),
            ..Self::new()
        }
    }

    /// Number of accounts that currently own a lane
    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    /// Queue an operation behind every operation already submitted for `account`
    ///
    /// The operation is enqueued before this method returns. The returned
    /// future resolves once the operation has run.
    ///
    /// # Arguments
    ///
    /// * `account` - Account whose lane the operation joins
    /// * `operation` - Unit of work to run once it reaches the head of the lane
    ///
    /// # Returns
    ///
    /// A future yielding the operation's own result, or
    /// `Err(LedgerError::TaskAborted)` if the operation panicked.
    pub fn submit<T, F, Fut>(
        &self,
        account: AccountId,
        operation: F,
    ) -> impl Future<Output = Result<T, LedgerError>> + Send + 'static
    where
        T: Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, LedgerError>> + Send + 'static,
    {
        let (result_tx, result_rx) = oneshot::channel();

        let job: Job = Box::new(move || {
            async move {
                let outcome = AssertUnwindSafe(async move { operation().await })
                    .catch_unwind()
                    .await;

                match outcome {
                    // The caller may have stopped waiting; the work is done either way.
                    Ok(result) => {
                        let _ = result_tx.send(result);
                    }
                    Err(_) => tracing::error!(account, "Queued operation panicked"),
                }
            }
            .boxed()
        });

        self.enqueue(account, job);

        async move {
            result_rx
                .await
                .unwrap_or_else(|_| Err(LedgerError::task_aborted(account)))
        }
    }

    /// Wait until every operation already queued, on every lane, has run
    ///
    /// Queues a no-op behind each live lane and awaits all of them. Operations
    /// submitted after `drain` starts are not waited for.
    pub async fn drain(&self) {
        let accounts: Vec<AccountId> = self.lanes.iter().map(|lane| *lane.key()).collect();

        let pending: Vec<_> = accounts
            .into_iter()
            .map(|account| self.submit(account, || async { Ok::<(), LedgerError>(()) }))
            .collect();

        join_all(pending).await;
    }

    fn enqueue(&self, account: AccountId, job: Job) {
        let mut lane = self
            .lanes
            .entry(account)
            .or_insert_with(|| self.spawn_lane(account));

        if let Err(mpsc::error::SendError(job)) = lane.sender.send(job) {
            // Only reachable if the worker died outside of a job.
            tracing::warn!(account, lane = lane.id, "Account lane closed, respawning");
            *lane = self.spawn_lane(account);
            let _ = lane.sender.send(job);
        }
    }

    fn spawn_lane(&self, account: AccountId) -> Lane {
        let id = self.next_lane_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::unbounded_channel();

        tracing::debug!(account, lane = id, "Opening account lane");
        tokio::spawn(run_lane(
            account,
            id,
            receiver,
            Arc::downgrade(&self.lanes),
            self.idle_eviction,
        ));

        Lane { id, sender }
    }
}

impl Default for AccountSerializer {
    fn default() -> Self {
        Self::new()
    }
}

/// Worker loop draining one account's lane
async fn run_lane(
    account: AccountId,
    lane_id: u64,
    mut receiver: mpsc::UnboundedReceiver<Job>,
    lanes: Weak<LaneMap>,
    idle_eviction: Option<Duration>,
) {
    loop {
        let next = match idle_eviction {
            None => receiver.recv().await,
            Some(idle) => {
                let waited = tokio::time::timeout(idle, receiver.recv()).await;
                match waited {
                    Ok(next) => next,
                    Err(_) => {
                        let Some(lanes) = lanes.upgrade() else { break };
                        let evicted = lanes.remove_if(&account, |_, lane| {
                            lane.id == lane_id && receiver.is_empty()
                        });
                        if evicted.is_some() {
                            tracing::debug!(account, lane = lane_id, "Evicted idle account lane");
                            break;
                        }
                        continue;
                    }
                }
            }
        };

        match next {
            Some(job) => job().await,
            None => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    #[tokio::test]
    async fn test_submit_returns_operation_result() {
        let serializer = AccountSerializer::new();

        let result = serializer.submit(1, || async { Ok(41 + 1) }).await;

        assert_eq!(result, Ok(42));
    }

    #[tokio::test]
    async fn test_submit_returns_operation_error() {
        let serializer = AccountSerializer::new();

        let result: Result<(), _> = serializer
            .submit(1, || async { Err(LedgerError::no_balance(1)) })
            .await;

        assert_eq!(result, Err(LedgerError::no_balance(1)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_operations_run_in_submission_order() {
        let serializer = AccountSerializer::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        // Earlier operations sleep longer, so any overlap would reorder the log.
        let pending: Vec<_> = (0..10u64)
            .map(|i| {
                let log = Arc::clone(&log);
                serializer.submit(1, move || async move {
                    tokio::time::sleep(Duration::from_millis(20 - i * 2)).await;
                    log.lock().unwrap().push(i);
                    Ok(())
                })
            })
            .collect();

        for result in futures::future::join_all(pending).await {
            assert!(result.is_ok());
        }

        assert_eq!(*log.lock().unwrap(), (0..10).collect::<Vec<_>>());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_at_most_one_operation_in_flight_per_account() {
        let serializer = AccountSerializer::new();
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let pending: Vec<_> = (0..50)
            .map(|_| {
                let in_flight = Arc::clone(&in_flight);
                let max_seen = Arc::clone(&max_seen);
                serializer.submit(7, move || async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    max_seen.fetch_max(now, Ordering::SeqCst);
                    tokio::task::yield_now().await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                })
            })
            .collect();

        futures::future::join_all(pending).await;

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_different_accounts_do_not_block_each_other() {
        let serializer = AccountSerializer::new();
        let (release_tx, release_rx) = oneshot::channel::<()>();

        // Account 1 cannot finish until account 2 has run.
        let blocked = serializer.submit(1, move || async move {
            release_rx
                .await
                .map_err(|_| LedgerError::task_aborted(1))
        });
        let releaser = serializer.submit(2, move || async move {
            let _ = release_tx.send(());
            Ok(())
        });

        let outcome = tokio::time::timeout(Duration::from_secs(5), async {
            futures::future::join(blocked, releaser).await
        })
        .await
        .expect("account 2 was blocked behind account 1");

        assert_eq!(outcome, (Ok(()), Ok(())));
    }

    #[tokio::test]
    async fn test_failed_operation_does_not_stall_lane() {
        let serializer = AccountSerializer::new();

        let failing = serializer.submit(1, || async {
            Err::<(), _>(LedgerError::store_unavailable("boom"))
        });
        let following = serializer.submit(1, || async { Ok("after") });

        assert_eq!(failing.await, Err(LedgerError::store_unavailable("boom")));
        assert_eq!(following.await, Ok("after"));
    }

    #[tokio::test]
    async fn test_panicking_operation_aborts_only_its_caller() {
        let serializer = AccountSerializer::new();

        let panicking = serializer.submit(3, || async {
            if true {
                panic!("operation blew up");
            }
            Ok(())
        });
        let following = serializer.submit(3, || async { Ok(5) });

        assert_eq!(panicking.await, Err(LedgerError::task_aborted(3)));
        assert_eq!(following.await, Ok(5));
    }

    #[tokio::test]
    async fn test_dropped_caller_still_runs_its_operation() {
        let serializer = AccountSerializer::new();
        let ran = Arc::new(AtomicUsize::new(0));

        let flag = Arc::clone(&ran);
        drop(serializer.submit(1, move || async move {
            flag.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));

        let observed = Arc::clone(&ran);
        let after = serializer
            .submit(1, move || async move { Ok(observed.load(Ordering::SeqCst)) })
            .await;

        assert_eq!(after, Ok(1));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_drain_waits_for_abandoned_operations() {
        let serializer = AccountSerializer::new();
        let ran = Arc::new(AtomicUsize::new(0));

        for account in [1, 2, 1, 3] {
            let ran = Arc::clone(&ran);
            drop(serializer.submit(account, move || async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                ran.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }));
        }

        serializer.drain().await;

        assert_eq!(ran.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_drain_without_lanes_returns_immediately() {
        let serializer = AccountSerializer::new();

        serializer.drain().await;

        assert_eq!(serializer.lane_count(), 0);
    }

    #[tokio::test]
    async fn test_lanes_are_created_once_per_account() {
        let serializer = AccountSerializer::new();

        for account in [1, 2, 1, 3, 2, 1] {
            serializer.submit(account, || async { Ok(()) }).await.unwrap();
        }

        assert_eq!(serializer.lane_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lanes_are_retained_without_eviction() {
        let serializer = AccountSerializer::new();

        serializer.submit(1, || async { Ok(()) }).await.unwrap();
        tokio::time::sleep(Duration::from_secs(3600)).await;

        assert_eq!(serializer.lane_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_lane_is_evicted_and_recreated() {
        let serializer = AccountSerializer::with_idle_eviction(Duration::from_millis(50));

        serializer.submit(1, || async { Ok(()) }).await.unwrap();
        assert_eq!(serializer.lane_count(), 1);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(serializer.lane_count(), 0);

        let result = serializer.submit(1, || async { Ok("again") }).await;
        assert_eq!(result, Ok("again"));
        assert_eq!(serializer.lane_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_busy_lane_is_not_evicted() {
        let serializer = AccountSerializer::with_idle_eviction(Duration::from_millis(50));

        // A single long operation keeps the worker busy past the idle window.
        let slow = serializer.submit(1, || async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Ok(())
        });
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(serializer.lane_count(), 1);
        assert_eq!(slow.await, Ok(()));
    }
}
