//! Draining outcomes from the queue.
//!
//! There are two strategies. [`drain_exact`] takes exactly as many
//! outcomes as it is told to, waiting as long as it takes. It is the right
//! choice if the transport enforces its own timeout, so that every request
//! is guaranteed to produce an outcome eventually.
//!
//! [`drain_until`] instead runs a pool of worker tasks that take outcomes
//! from the queue until a deadline. Requests whose outcome has not arrived
//! by then remain outstanding and are reported as not returned. This bounds
//! the time spent draining even if the transport loses requests. Requests
//! may still be dispatched while the drain is running. Only once the batch
//! has been closed will the drain stop before the deadline.

use std::panic;
use std::pin::pin;
use std::sync::Arc;

use tokio::task::{JoinError, JoinSet};
use tokio::time::{timeout_at, Instant};
use tracing::{debug, error, trace, warn};

use crate::ledger::{Ledger, Settled};
use crate::queue::ResultQueue;

//------------ Drained -------------------------------------------------------

/// What happened during a bounded drain.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Drained {
    /// The number of drain tasks started.
    pub tasks: usize,

    /// The number of outcomes taken from the queue.
    pub taken: usize,

    /// The number of tasks that reached the deadline without an outcome.
    pub timed_out: usize,

    /// Whether draining stopped before the deadline because the batch was
    /// closed and nothing was outstanding any more.
    pub finished_early: bool,
}

impl Drained {
    /// Records the result of a finished drain task.
    fn record(&mut self, res: Result<Option<Settled>, JoinError>) {
        match res {
            Ok(Some(_)) => self.taken += 1,
            Ok(None) => self.timed_out += 1,
            Err(err) => {
                if err.is_panic() {
                    error!("drain task panicked");
                    panic::resume_unwind(err.into_panic())
                }
                // Tasks are never aborted, so this is the runtime shutting
                // down underneath us.
                warn!(%err, "drain task cancelled");
            }
        }
    }
}

//------------ drain_exact ---------------------------------------------------

/// Takes and settles exactly `expected` outcomes.
///
/// If fewer than `expected` outcomes ever arrive, this waits forever.
pub(crate) async fn drain_exact<T, R, E>(
    queue: &ResultQueue<R, E>,
    ledger: &Ledger<T, R, E>,
    expected: usize,
) {
    let outstanding = ledger.outstanding().len();
    if expected > outstanding {
        warn!(
            expected,
            outstanding, "draining more outcomes than requests outstanding"
        );
    }
    debug!(expected, "draining outcomes");
    for _ in 0..expected {
        ledger.settle(queue.take().await);
    }
    debug!(expected, "drained outcomes");
}

//------------ drain_until ---------------------------------------------------

/// Takes and settles outcomes with up to `workers` tasks until `deadline`.
///
/// New drain tasks are started as long as there are outstanding requests
/// that no running task is already waiting for. While nothing is
/// outstanding, the function waits for new requests to be recorded. No
/// task is started once the deadline has passed, and running tasks give up
/// waiting at the deadline. Tasks are never aborted: the function returns
/// once all started tasks have finished.
///
/// If the ledger has been closed and all outstanding requests have been
/// settled before the deadline, the function returns early.
pub(crate) async fn drain_until<T, R, E>(
    queue: &ResultQueue<R, E>,
    ledger: &Arc<Ledger<T, R, E>>,
    workers: usize,
    deadline: Instant,
) -> Drained
where
    T: Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
{
    let workers = workers.max(1);
    let mut pool = JoinSet::new();
    let mut res = Drained::default();

    debug!(
        workers,
        outstanding = ledger.outstanding().len(),
        "starting bounded drain"
    );
    loop {
        while let Some(finished) = pool.try_join_next() {
            res.record(finished);
        }
        if Instant::now() >= deadline {
            debug!("drain deadline reached");
            break;
        }

        let running = pool.len();
        let outstanding = ledger.outstanding().len();
        if running == 0 && outstanding == 0 {
            if ledger.is_closed() {
                res.finished_early = true;
                break;
            }
            // Requests may still be on their way. The future is enabled
            // before checking again so a request recorded in between
            // isn't missed.
            let mut changed = pin!(ledger.changed());
            changed.as_mut().enable();
            if ledger.outstanding().is_empty() && !ledger.is_closed() {
                trace!("waiting for requests");
                if timeout_at(deadline, changed).await.is_err() {
                    debug!("drain deadline reached");
                    break;
                }
            }
            continue;
        }
        if running >= workers || running >= outstanding {
            // Either all workers are busy or every outstanding request
            // already has a task waiting for it. Wait for a task to finish.
            match timeout_at(deadline, pool.join_next()).await {
                Ok(Some(finished)) => res.record(finished),
                Ok(None) => {}
                Err(_) => {
                    debug!("drain deadline reached");
                    break;
                }
            }
            trace!(
                success = ledger.counters().success(),
                failure = ledger.counters().failure(),
                outstanding = ledger.outstanding().len(),
                "drain progress"
            );
            continue;
        }

        let queue = queue.clone();
        let ledger = ledger.clone();
        pool.spawn(async move {
            match queue.take_until(deadline).await {
                Ok(outcome) => Some(ledger.settle(outcome)),
                Err(_) => None,
            }
        });
        res.tasks += 1;
    }

    // Let the tasks still running finish. They will all have given up by
    // the deadline.
    while let Some(finished) = pool.join_next().await {
        res.record(finished);
    }
    debug!(
        tasks = res.tasks,
        taken = res.taken,
        unreturned = ledger.outstanding().len(),
        "bounded drain finished"
    );
    res
}

//============ Tests =========================================================
