//! Settling outcomes against outstanding requests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::vec::Vec;

use parking_lot::Mutex;
use tokio::sync::futures::Notified;
use tokio::sync::Notify;
use tracing::{debug, trace, warn};

use crate::id::CorrelationId;
use crate::outstanding::Outstanding;
use crate::request::{Outcome, Request};
use crate::stats::Counters;

//------------ Settled -------------------------------------------------------

/// What became of an outcome taken from the queue.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Settled {
    /// The outcome resolved a request successfully.
    Success,

    /// The outcome resolved a request as failed.
    Failure,

    /// The outcome matched no outstanding request.
    Unmatched,
}

//------------ Ledger --------------------------------------------------------

/// The book-keeping shared by the dispatch loop and all drain workers.
#[derive(Debug)]
pub(crate) struct Ledger<T, R, E> {
    /// The requests sent but not resolved yet.
    outstanding: Outstanding<Request<T>>,

    /// The counters.
    counters: Counters,

    /// The outcomes settled so far if they are to be kept.
    retained: Option<Mutex<Vec<Outcome<R, E>>>>,

    /// Woken whenever a request is recorded or the ledger is closed.
    changed: Notify,

    /// Whether no more requests will be recorded.
    closed: AtomicBool,
}

impl<T, R, E> Ledger<T, R, E> {
    /// Creates a new, empty ledger.
    ///
    /// If `retain` is `true`, settled outcomes are kept and can be
    /// collected via [`take_outcomes`][Self::take_outcomes].
    pub fn new(retain: bool) -> Self {
        Ledger {
            outstanding: Outstanding::new(),
            counters: Counters::new(),
            retained: retain.then(|| Mutex::new(Vec::new())),
            changed: Notify::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Returns the outstanding requests.
    pub fn outstanding(&self) -> &Outstanding<Request<T>> {
        &self.outstanding
    }

    /// Returns the counters.
    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    /// Records a request as outstanding.
    ///
    /// Wakes up everyone waiting in [`changed`][Self::changed]. If a
    /// request with the same identifier is outstanding already, the
    /// request is given back.
    pub fn record(&self, request: Request<T>) -> Result<(), Request<T>> {
        self.outstanding.insert(request.id(), request)?;
        self.changed.notify_waiters();
        Ok(())
    }

    /// Removes a request that never made it to the transport.
    pub fn withdraw(&self, id: CorrelationId) -> Option<Request<T>> {
        self.outstanding.remove(id)
    }

    /// Removes all outstanding requests and counts them as withdrawn.
    ///
    /// The requests are returned ordered by their identifier.
    pub fn withdraw_all(&self) -> Vec<Request<T>> {
        let requests: Vec<_> = self
            .outstanding
            .drain()
            .into_iter()
            .map(|(_, request)| request)
            .collect();
        self.counters.add_withdrawn(requests.len());
        requests
    }

    /// Declares that no more requests will be recorded.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!(outstanding = self.outstanding.len(), "batch closed");
        }
        self.changed.notify_waiters();
    }

    /// Returns whether the ledger has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Returns a future resolving once a request is recorded or the
    /// ledger is closed.
    ///
    /// Only notifications sent after the future was enabled or first
    /// polled are seen, so enable it before checking the state it is
    /// waiting for.
    pub fn changed(&self) -> Notified<'_> {
        self.changed.notified()
    }

    /// Settles an outcome taken from the queue.
    ///
    /// The matching request is removed from the outstanding requests and
    /// the outcome is counted. An outcome for an identifier that is not
    /// outstanding, say a second outcome for the same request, is only
    /// counted as unmatched.
    pub fn settle(&self, outcome: Outcome<R, E>) -> Settled {
        let id = outcome.id();
        if self.outstanding.remove(id).is_none() {
            warn!(%id, "outcome for unknown request");
            self.counters.inc_unmatched();
            return Settled::Unmatched;
        }
        let settled = if outcome.is_success() {
            self.counters.inc_success();
            Settled::Success
        } else {
            self.counters.inc_failure();
            Settled::Failure
        };
        trace!(%id, ?settled, "settled outcome");
        if let Some(retained) = self.retained.as_ref() {
            retained.lock().push(outcome);
        }
        settled
    }

    /// Removes and returns all outcomes retained so far.
    ///
    /// Returns an empty vec if outcomes are not being retained.
    pub fn take_outcomes(&self) -> Vec<Outcome<R, E>> {
        match self.retained.as_ref() {
            Some(retained) => std::mem::take(&mut *retained.lock()),
            None => Vec::new(),
        }
    }
}

//============ Tests =========================================================
