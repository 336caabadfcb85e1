//! The queue transports publish outcomes into.
//!
//! A [`ResultQueue`] is the only point of synchronization between the
//! completion path of a transport, which produces outcomes, and the drain
//! strategies consuming them. Publishing never waits, so a slow consumer
//! can never hold up a transport. Consumers wait for outcomes either
//! indefinitely via [`take`][ResultQueue::take] or up to a deadline via
//! [`take_until`][ResultQueue::take_until].
//!
//! The queue is a cheap handle around shared state. Clone it to give the
//! same queue to several producers or consumers. Outcomes are taken in the
//! order they were published. With several consumers, each outcome is
//! taken by exactly one of them.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::time::{timeout_at, Instant};

use crate::error::TimedOut;
use crate::request::Outcome;

//------------ ResultQueue ---------------------------------------------------

/// A multi-producer, multi-consumer queue of outcomes.
pub struct ResultQueue<R, E> {
    /// The state shared by all handles.
    inner: Arc<Inner<R, E>>,
}

/// The shared state of a queue.
struct Inner<R, E> {
    /// The sending half used by producers.
    tx: mpsc::UnboundedSender<Outcome<R, E>>,

    /// The receiving half shared by consumers.
    ///
    /// The lock is fair, so waiting consumers are served in the order
    /// they started waiting.
    rx: Mutex<mpsc::UnboundedReceiver<Outcome<R, E>>>,

    /// The number of outcomes published but not yet taken.
    queued: AtomicUsize,
}

impl<R, E> ResultQueue<R, E> {
    /// Creates a new, empty queue.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        ResultQueue {
            inner: Arc::new(Inner {
                tx,
                rx: Mutex::new(rx),
                queued: AtomicUsize::new(0),
            }),
        }
    }

    /// Publishes an outcome.
    ///
    /// This never waits and can be called from any thread, whether it is
    /// part of an async runtime or not.
    pub fn put(&self, outcome: Outcome<R, E>) {
        self.inner.queued.fetch_add(1, Ordering::AcqRel);
        if self.inner.tx.send(outcome).is_err() {
            // The receiver lives in the same allocation as the sender.
            self.inner.queued.fetch_sub(1, Ordering::AcqRel);
        }
    }

    /// Takes the next outcome, waiting for one if the queue is empty.
    ///
    /// This method is cancel safe: if the returned future is dropped
    /// before it completes, no outcome is lost.
    pub async fn take(&self) -> Outcome<R, E> {
        let outcome = {
            let mut rx = self.inner.rx.lock().await;
            rx.recv()
                .await
                .expect("queue holds its own sender and never closes")
        };
        self.inner.queued.fetch_sub(1, Ordering::AcqRel);
        outcome
    }

    /// Takes the next outcome, waiting no longer than until `deadline`.
    ///
    /// If the deadline has passed already, an outcome is only returned if
    /// one is available right away. A timed out call takes nothing from
    /// the queue.
    pub async fn take_until(
        &self,
        deadline: Instant,
    ) -> Result<Outcome<R, E>, TimedOut> {
        match timeout_at(deadline, self.take()).await {
            Ok(outcome) => Ok(outcome),
            Err(_) => self.try_take().ok_or(TimedOut),
        }
    }

    /// Takes the next outcome if one is available right now.
    ///
    /// Returns `None` if the queue is empty or another consumer is
    /// currently taking from it.
    pub fn try_take(&self) -> Option<Outcome<R, E>> {
        let mut rx = self.inner.rx.try_lock().ok()?;
        let outcome = rx.try_recv().ok()?;
        self.inner.queued.fetch_sub(1, Ordering::AcqRel);
        Some(outcome)
    }

    /// Returns the number of outcomes waiting to be taken.
    ///
    /// With concurrent producers and consumers, the value may already be
    /// out of date when it is returned.
    pub fn len(&self) -> usize {
        self.inner.queued.load(Ordering::Acquire)
    }

    /// Returns whether there currently are no outcomes waiting.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

//--- Default, Clone

impl<R, E> Default for ResultQueue<R, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R, E> Clone for ResultQueue<R, E> {
    fn clone(&self) -> Self {
        ResultQueue {
            inner: self.inner.clone(),
        }
    }
}

//--- Debug

impl<R, E> fmt::Debug for ResultQueue<R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultQueue")
            .field("queued", &self.len())
            .finish()
    }
}

//============ Tests =========================================================
