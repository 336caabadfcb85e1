//! Counting outcomes and reporting on a batch.

use core::fmt;
use core::sync::atomic::{AtomicUsize, Ordering};
use core::time::Duration;

//------------ Counters ------------------------------------------------------

/// The counters of a batch.
///
/// Each counter is an independent atomic. While a batch is running, the
/// counters can be read at any time for progress reporting, but they are
/// not guaranteed to be consistent with each other. Once draining has
/// stopped, they are exact.
#[derive(Debug, Default)]
pub struct Counters {
    /// Requests handed to the transport.
    sent: AtomicUsize,

    /// Successful outcomes taken.
    success: AtomicUsize,

    /// Failed outcomes taken.
    failure: AtomicUsize,

    /// Items that could not be dispatched.
    rejected: AtomicUsize,

    /// Outcomes taken that matched no outstanding request.
    unmatched: AtomicUsize,

    /// Requests taken back out of the batch without an outcome.
    withdrawn: AtomicUsize,
}

impl Counters {
    /// Creates a new set of counters all at zero.
    pub fn new() -> Self {
        Default::default()
    }

    /// Returns the number of requests handed to the transport.
    pub fn sent(&self) -> usize {
        self.sent.load(Ordering::Relaxed)
    }

    /// Returns the number of successful outcomes.
    pub fn success(&self) -> usize {
        self.success.load(Ordering::Relaxed)
    }

    /// Returns the number of failed outcomes.
    pub fn failure(&self) -> usize {
        self.failure.load(Ordering::Relaxed)
    }

    /// Returns the number of items that could not be dispatched.
    pub fn rejected(&self) -> usize {
        self.rejected.load(Ordering::Relaxed)
    }

    /// Returns the number of outcomes not matching any request.
    pub fn unmatched(&self) -> usize {
        self.unmatched.load(Ordering::Relaxed)
    }

    /// Returns the number of requests withdrawn without an outcome.
    pub fn withdrawn(&self) -> usize {
        self.withdrawn.load(Ordering::Relaxed)
    }

    pub(crate) fn inc_sent(&self) {
        self.sent.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_success(&self) {
        self.success.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_failure(&self) {
        self.failure.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_unmatched(&self) {
        self.unmatched.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_withdrawn(&self, count: usize) {
        self.withdrawn.fetch_add(count, Ordering::Relaxed);
    }

    /// Creates a report from the current values of the counters.
    pub fn report(&self, elapsed: Duration) -> Report {
        let sent = self.sent();
        let success = self.success();
        let failure = self.failure();
        let withdrawn = self.withdrawn();
        Report {
            sent,
            success,
            failure,
            unreturned: sent.saturating_sub(success + failure + withdrawn),
            rejected: self.rejected(),
            unmatched: self.unmatched(),
            withdrawn,
            elapsed,
        }
    }
}

//------------ Report --------------------------------------------------------

/// A summary of a batch.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Report {
    /// The number of requests handed to the transport.
    pub sent: usize,

    /// The number of requests that were answered.
    pub success: usize,

    /// The number of requests that failed.
    pub failure: usize,

    /// The number of requests without an outcome.
    ///
    /// This is `sent - success - failure - withdrawn`.
    pub unreturned: usize,

    /// The number of input items that were never sent.
    pub rejected: usize,

    /// The number of outcomes that matched no outstanding request.
    pub unmatched: usize,

    /// The number of requests taken back out of the batch before they
    /// produced an outcome, usually to send them again.
    pub withdrawn: usize,

    /// The wall-clock time from the start of the batch until draining
    /// last stopped.
    ///
    /// Dispatching more requests unfreezes it, so it keeps growing until
    /// the next drain has stopped.
    pub elapsed: Duration,
}

impl Report {
    /// Returns whether every request sent produced an outcome.
    pub fn is_complete(&self) -> bool {
        self.unreturned == 0
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sent {} requests, received {} responses and {} errors in {}ms",
            self.sent,
            self.success,
            self.failure,
            self.elapsed.as_millis()
        )?;
        if self.unreturned > 0 {
            write!(f, ", {} did not return", self.unreturned)?;
        }
        if self.rejected > 0 {
            write!(f, ", {} not sent", self.rejected)?;
        }
        if self.unmatched > 0 {
            write!(f, ", {} unmatched", self.unmatched)?;
        }
        if self.withdrawn > 0 {
            write!(f, ", {} withdrawn", self.withdrawn)?;
        }
        Ok(())
    }
}

//============ Tests =========================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::string::ToString;

    #[test]
    fn unreturned_is_derived() {
        let counters = Counters::new();
        for _ in 0..5 {
            counters.inc_sent();
        }
        counters.inc_success();
        counters.inc_success();
        counters.inc_failure();
        counters.inc_rejected();

        let report = counters.report(Duration::from_millis(1500));
        assert_eq!(
            report,
            Report {
                sent: 5,
                success: 2,
                failure: 1,
                unreturned: 2,
                rejected: 1,
                unmatched: 0,
                withdrawn: 0,
                elapsed: Duration::from_millis(1500),
            }
        );
        assert!(!report.is_complete());

        counters.add_withdrawn(2);
        let report = counters.report(Duration::from_millis(1500));
        assert_eq!(report.unreturned, 0);
        assert_eq!(report.withdrawn, 2);
        assert!(report.is_complete());
    }

    #[test]
    fn display() {
        let report = Report {
            sent: 3,
            success: 2,
            failure: 1,
            elapsed: Duration::from_millis(42),
            ..Default::default()
        };
        assert_eq!(
            report.to_string(),
            "sent 3 requests, received 2 responses and 1 errors in 42ms"
        );

        let report = Report {
            unreturned: 1,
            unmatched: 2,
            ..report
        };
        assert_eq!(
            report.to_string(),
            "sent 3 requests, received 2 responses and 1 errors in 42ms, \
             1 did not return, 2 unmatched"
        );
    }
}
