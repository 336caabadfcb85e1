//! Configuration of a batch.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use core::cmp;
use core::time::Duration;

use tokio::time::Instant;

use crate::id::IdStart;

//------------ Configuration Constants ----------------------------------------

/// Configuration limits for the number of drain workers.
const WORKERS: DefMinMax<usize> = DefMinMax::new(10, 1, 1000);

/// Configuration limits for the transport timeout.
const TRANSPORT_TIMEOUT: DefMinMax<Duration> = DefMinMax::new(
    Duration::from_secs(30),
    Duration::from_millis(1),
    Duration::from_secs(3600),
);

/// Configuration limits for the deadline factor.
const DEADLINE_FACTOR: DefMinMax<u32> = DefMinMax::new(2, 1, 100);

//------------ Config ---------------------------------------------------------

/// Configuration for a batch.
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum number of drain tasks running at the same time.
    workers: usize,

    /// The time after which the transport gives up on a request.
    transport_timeout: Duration,

    /// Multiple of the transport timeout a bounded drain waits.
    deadline_factor: u32,

    /// Where correlation identifiers start.
    id_start: IdStart,

    /// Whether settled outcomes are kept.
    retain_outcomes: bool,
}

impl Config {
    /// Creates a new config with default values.
    pub fn new() -> Self {
        Default::default()
    }

    /// Returns the number of drain workers.
    ///
    /// A bounded drain never runs more than this many tasks taking
    /// outcomes from the queue at the same time.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Sets the number of drain workers.
    ///
    /// If this value is too small or too large, it will be caped.
    pub fn set_workers(&mut self, value: usize) {
        self.workers = WORKERS.limit(value)
    }

    /// Returns the transport timeout.
    ///
    /// This is the time after which the transport reports a request as
    /// failed. The harness does not enforce it. It is only used to derive
    /// the deadline of a bounded drain.
    pub fn transport_timeout(&self) -> Duration {
        self.transport_timeout
    }

    /// Sets the transport timeout.
    ///
    /// If this value is too small or too large, it will be caped.
    pub fn set_transport_timeout(&mut self, value: Duration) {
        self.transport_timeout = TRANSPORT_TIMEOUT.limit(value)
    }

    /// Returns the deadline factor.
    ///
    /// A bounded drain stops this many transport timeouts after it
    /// started.
    pub fn deadline_factor(&self) -> u32 {
        self.deadline_factor
    }

    /// Sets the deadline factor.
    ///
    /// If this value is too small or too large, it will be caped.
    pub fn set_deadline_factor(&mut self, value: u32) {
        self.deadline_factor = DEADLINE_FACTOR.limit(value)
    }

    /// Returns where correlation identifiers start.
    pub fn id_start(&self) -> IdStart {
        self.id_start
    }

    /// Sets where correlation identifiers start.
    pub fn set_id_start(&mut self, value: IdStart) {
        self.id_start = value
    }

    /// Returns whether settled outcomes are kept.
    pub fn retain_outcomes(&self) -> bool {
        self.retain_outcomes
    }

    /// Sets whether settled outcomes are kept.
    ///
    /// If they are, they can be collected after draining via
    /// [`Batch::take_outcomes`][crate::Batch::take_outcomes].
    pub fn set_retain_outcomes(&mut self, value: bool) {
        self.retain_outcomes = value
    }

    /// Returns how long a bounded drain waits in total.
    pub fn drain_duration(&self) -> Duration {
        self.transport_timeout.saturating_mul(self.deadline_factor)
    }

    /// Returns the deadline of a bounded drain starting at `start`.
    pub fn drain_deadline(&self, start: Instant) -> Instant {
        start + self.drain_duration()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workers: WORKERS.default(),
            transport_timeout: TRANSPORT_TIMEOUT.default(),
            deadline_factor: DEADLINE_FACTOR.default(),
            id_start: IdStart::default(),
            retain_outcomes: false,
        }
    }
}

//------------ DefMinMax -----------------------------------------------------

/// A default value together with the range it can be set to.
#[derive(Clone, Copy)]
struct DefMinMax<T> {
    /// The default value.
    def: T,

    /// The smallest allowed value.
    min: T,

    /// The largest allowed value.
    max: T,
}

impl<T> DefMinMax<T> {
    /// Creates a new value.
    const fn new(def: T, min: T, max: T) -> Self {
        Self { def, min, max }
    }

    /// Returns the default value.
    fn default(self) -> T {
        self.def
    }

    /// Clamps `value` into the allowed range.
    fn limit(self, value: T) -> T
    where
        T: Ord,
    {
        cmp::max(self.min, cmp::min(self.max, value))
    }
}

//============ Tests =========================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::new();
        assert_eq!(config.workers(), 10);
        assert_eq!(config.transport_timeout(), Duration::from_secs(30));
        assert_eq!(config.deadline_factor(), 2);
        assert_eq!(config.id_start(), IdStart::Zero);
        assert!(!config.retain_outcomes());
        assert_eq!(config.drain_duration(), Duration::from_secs(60));
    }

    #[test]
    fn values_are_capped() {
        let mut config = Config::new();
        config.set_workers(0);
        assert_eq!(config.workers(), 1);
        config.set_workers(1_000_000);
        assert_eq!(config.workers(), 1000);
        config.set_deadline_factor(0);
        assert_eq!(config.deadline_factor(), 1);
        config.set_transport_timeout(Duration::ZERO);
        assert_eq!(config.transport_timeout(), Duration::from_millis(1));
        config.set_transport_timeout(Duration::from_secs(86400));
        assert_eq!(config.transport_timeout(), Duration::from_secs(3600));
    }

    #[test]
    fn deadline() {
        let mut config = Config::new();
        config.set_transport_timeout(Duration::from_secs(5));
        config.set_deadline_factor(3);
        let start = Instant::now();
        assert_eq!(
            config.drain_deadline(start),
            start + Duration::from_secs(15)
        );
    }
}
