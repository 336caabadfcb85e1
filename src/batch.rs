//! A batch of requests.
//!
//! A [`Batch`] holds everything needed to send a large number of requests
//! through a transport and collect their outcomes: the generator for
//! correlation identifiers, the queue the transport publishes outcomes
//! into, the outstanding requests, and the counters. Each batch has its
//! own set of these, so independent batches can run side by side.
//!
//! # Usage
//!
//! 1. Create a batch via [`Batch::new`] from a transport and a [`Config`].
//!
//! 2. Call [`Batch::dispatch`] with the input items and a function that
//!    turns each item into a request payload.
//!
//! 3. Drain the outcomes either with [`Batch::drain_exact`], passing the
//!    number of requests sent, or with [`Batch::drain_with_deadline`] or
//!    [`Batch::drain_until`] if not all requests may produce an outcome.
//!    Dispatching can carry on while a drain is running. A bounded drain
//!    runs until its deadline unless the batch was closed via
//!    [`Batch::close`] and all requests have been settled.
//!
//! 4. Get the summary via [`Batch::report`]. Requests that never returned
//!    can be taken out via [`Batch::take_unreturned`] and sent again.

use std::error;
use std::sync::Arc;
use std::vec::Vec;

use parking_lot::Mutex;
use tokio::time::Instant;

use crate::config::Config;
use crate::dispatch::{self, Dispatched};
use crate::drain::{self, Drained};
use crate::error::Error;
use crate::id::{CorrelationId, IdGenerator};
use crate::ledger::Ledger;
use crate::outstanding::Outstanding;
use crate::queue::ResultQueue;
use crate::request::{Outcome, Request};
use crate::stats::{Counters, Report};
use crate::transport::Transport;

//------------ Batch ---------------------------------------------------------

/// A batch of requests sent through a transport.
pub struct Batch<X: Transport> {
    /// The transport requests are sent through.
    transport: X,

    /// The configuration.
    config: Config,

    /// The source of correlation identifiers.
    ids: IdGenerator,

    /// The queue the transport publishes outcomes into.
    queue: ResultQueue<X::Response, X::Failure>,

    /// Outstanding requests and counters, shared with drain tasks.
    ledger: Arc<Ledger<X::Payload, X::Response, X::Failure>>,

    /// When the batch was created.
    started: Instant,

    /// When draining last stopped.
    finished: Mutex<Option<Instant>>,
}

impl<X: Transport> Batch<X> {
    /// Creates a new batch.
    ///
    /// The time reported as elapsed is measured from here.
    pub fn new(transport: X, config: Config) -> Self {
        Batch {
            transport,
            ids: IdGenerator::new(config.id_start()),
            queue: ResultQueue::new(),
            ledger: Arc::new(Ledger::new(config.retain_outcomes())),
            config,
            started: Instant::now(),
            finished: Mutex::new(None),
        }
    }

    /// Returns a reference to the transport.
    pub fn transport(&self) -> &X {
        &self.transport
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns a reference to the queue outcomes are published into.
    pub fn queue(&self) -> &ResultQueue<X::Response, X::Failure> {
        &self.queue
    }

    /// Returns the requests currently outstanding.
    pub fn outstanding(&self) -> &Outstanding<Request<X::Payload>> {
        self.ledger.outstanding()
    }

    /// Returns the counters of the batch.
    pub fn counters(&self) -> &Counters {
        self.ledger.counters()
    }

    /// Returns a summary of the batch.
    ///
    /// Once draining has stopped, this returns the same exact values every
    /// time until more requests are dispatched or withdrawn. While
    /// draining, it gives a snapshot of the progress so far.
    pub fn report(&self) -> Report {
        let end = (*self.finished.lock()).unwrap_or_else(Instant::now);
        self.ledger.counters().report(end - self.started)
    }

    /// Removes and returns the outcomes settled so far.
    ///
    /// This is always empty unless
    /// [`Config::set_retain_outcomes`] was enabled.
    pub fn take_outcomes(&self) -> Vec<Outcome<X::Response, X::Failure>> {
        self.ledger.take_outcomes()
    }

    /// Removes and returns the requests that are still outstanding.
    ///
    /// The requests are ordered by their correlation identifier. In the
    /// report, they move from unreturned to withdrawn, so they can be sent
    /// again via [`resend`][Self::resend] without being counted twice.
    /// Their outcomes will be counted as unmatched should they still arrive
    /// and be drained later.
    pub fn take_unreturned(&self) -> Vec<Request<X::Payload>> {
        self.ledger.withdraw_all()
    }

    /// Declares that no more requests will be dispatched.
    ///
    /// A bounded drain of a closed batch returns as soon as all
    /// outstanding requests have been settled instead of waiting for more
    /// requests until its deadline. Requests can still be dispatched after
    /// closing, but a running drain may not wait for their outcomes.
    pub fn close(&self) {
        self.ledger.close()
    }

    /// Returns whether the batch has been closed.
    pub fn is_closed(&self) -> bool {
        self.ledger.is_closed()
    }

    /// Marks the end of draining.
    fn finish(&self) {
        *self.finished.lock() = Some(Instant::now());
    }

    /// Lets the elapsed time run again after new requests were dispatched.
    fn resume(&self) {
        *self.finished.lock() = None;
    }
}

/// # Dispatching
///
impl<X> Batch<X>
where
    X: Transport,
    X::Payload: Clone,
{
    /// Dispatches a sequence of items.
    ///
    /// For each item, `compose` is called with the item and its freshly
    /// assigned correlation identifier and returns the payload for the
    /// request. The request is recorded as outstanding and handed to the
    /// transport. This never waits for any outcomes.
    ///
    /// Items for which `compose` fails or which the transport rejects are
    /// skipped and returned in [`Dispatched::failures`].
    pub fn dispatch<I, F, C>(&self, items: I, compose: F) -> Dispatched
    where
        I: IntoIterator,
        F: FnMut(I::Item, CorrelationId) -> Result<X::Payload, C>,
        C: Into<Box<dyn error::Error + Send + Sync>>,
    {
        self.resume();
        dispatch::dispatch(
            &self.transport,
            &self.ids,
            &self.queue,
            &self.ledger,
            items,
            compose,
        )
    }

    /// Sends a single payload as a new request.
    ///
    /// Returns the correlation identifier assigned to the request.
    pub fn send(&self, payload: X::Payload) -> Result<CorrelationId, Error> {
        self.resume();
        let id = self.ids.next();
        let res = dispatch::send(
            &self.transport,
            &self.queue,
            &self.ledger,
            Request::new(id, payload),
        );
        if res.is_err() {
            self.ledger.counters().inc_rejected();
        }
        res.map(|_| id)
    }

    /// Sends requests taken from a batch again.
    ///
    /// Each payload receives a new correlation identifier. This is intended
    /// for requests returned by [`take_unreturned`][Self::take_unreturned]
    /// of this or another batch. Since taking them counted them as
    /// withdrawn, a retry into the same batch that is fully answered
    /// leaves nothing unreturned.
    pub fn resend<I>(&self, requests: I) -> Dispatched
    where
        I: IntoIterator<Item = Request<X::Payload>>,
    {
        self.dispatch(requests, |request, _| {
            Ok::<_, Error>(request.into_payload())
        })
    }
}

/// # Draining
///
impl<X> Batch<X>
where
    X: Transport,
    X::Payload: Send + 'static,
    X::Response: Send + 'static,
    X::Failure: Send + 'static,
{
    /// Takes exactly `expected` outcomes from the queue.
    ///
    /// This is the right strategy if the transport has its own timeout and
    /// thus every request will produce an outcome eventually. Pass the
    /// number of requests sent. If fewer outcomes arrive, this will wait
    /// forever.
    pub async fn drain_exact(&self, expected: usize) -> Report {
        drain::drain_exact(&self.queue, &self.ledger, expected).await;
        self.finish();
        self.report()
    }

    /// Takes outcomes with a pool of workers until the given deadline.
    ///
    /// The number of workers is taken from the configuration. Requests
    /// dispatched while the drain is running are picked up as well.
    /// Requests that have not produced an outcome by the deadline stay
    /// outstanding and are reported as unreturned. Returns early only if
    /// the batch has been [closed][Self::close] and all outstanding
    /// requests have been settled.
    pub async fn drain_until(&self, deadline: Instant) -> Drained {
        let res = drain::drain_until(
            &self.queue,
            &self.ledger,
            self.config.workers(),
            deadline,
        )
        .await;
        self.finish();
        res
    }

    /// Takes outcomes with a pool of workers until the configured deadline.
    ///
    /// The deadline is the configured multiple of the transport timeout
    /// from now.
    pub async fn drain_with_deadline(&self) -> Drained {
        self.drain_until(self.config.drain_deadline(Instant::now()))
            .await
    }
}

//============ Tests =========================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Rejected;
    use crate::id::IdStart;
    use core::time::Duration;

    /// A transport that answers nothing on its own.
    ///
    /// Tests publish outcomes into the batch’s queue themselves.
    struct Silent;

    impl Transport for Silent {
        type Payload = u32;
        type Response = u32;
        type Failure = ();

        fn send_async(
            &self,
            _: Request<u32>,
            _: &ResultQueue<u32, ()>,
        ) -> Result<(), Rejected> {
            Ok(())
        }
    }

    fn infallible(
        item: u32,
        _: CorrelationId,
    ) -> Result<u32, core::convert::Infallible> {
        Ok(item)
    }

    #[tokio::test(start_paused = true)]
    async fn report_is_frozen_after_drain() {
        let batch = Batch::new(Silent, Config::new());
        batch.dispatch([1, 2], infallible);
        batch.queue().put(Outcome::success(CorrelationId::from_u32(0), 1));
        batch.queue().put(Outcome::failure(CorrelationId::from_u32(1), ()));

        let report = batch.drain_exact(2).await;
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(batch.report(), report);
        assert_eq!(batch.report(), batch.report());
        assert_eq!(report.success, 1);
        assert_eq!(report.failure, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unreturned_can_be_resent() {
        let mut config = Config::new();
        config.set_id_start(IdStart::At(100));
        config.set_transport_timeout(Duration::from_secs(1));
        let batch = Batch::new(Silent, config);
        batch.dispatch([7, 8, 9], infallible);
        batch.queue().put(Outcome::success(CorrelationId::from_u32(101), 8));

        let drained = batch.drain_with_deadline().await;
        assert_eq!(drained.taken, 1);
        let report = batch.report();
        assert_eq!(report.unreturned, 2);

        let unreturned = batch.take_unreturned();
        assert_eq!(
            unreturned.iter().map(Request::id).collect::<Vec<_>>(),
            vec![CorrelationId::from_u32(100), CorrelationId::from_u32(102)]
        );
        assert!(batch.outstanding().is_empty());
        let after = batch.report();
        assert_eq!(after.unreturned, 0);
        assert_eq!(after.withdrawn, 2);
        assert_eq!(after.elapsed, report.elapsed);

        let retry = Batch::new(Silent, Config::new());
        let dispatched = retry.resend(unreturned);
        assert_eq!(dispatched.sent, 2);
        assert_eq!(
            retry.outstanding().ids(),
            vec![CorrelationId::from_u32(0), CorrelationId::from_u32(1)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn resend_into_same_batch_counts_once() {
        let mut config = Config::new();
        config.set_transport_timeout(Duration::from_secs(1));
        let batch = Batch::new(Silent, config);
        batch.dispatch([1, 2], infallible);
        batch.queue().put(Outcome::success(CorrelationId::from_u32(0), 1));
        batch.drain_with_deadline().await;
        assert_eq!(batch.report().unreturned, 1);

        let dispatched = batch.resend(batch.take_unreturned());
        assert_eq!(dispatched.sent, 1);
        batch.queue().put(Outcome::success(CorrelationId::from_u32(2), 2));
        let report = batch.drain_exact(1).await;

        assert_eq!(report.sent, 3);
        assert_eq!(report.success, 2);
        assert_eq!(report.withdrawn, 1);
        assert_eq!(report.unreturned, 0);
        assert!(report.is_complete());
    }

    #[tokio::test(start_paused = true)]
    async fn dispatch_resumes_elapsed_time() {
        let batch = Batch::new(Silent, Config::new());
        batch.dispatch([1], infallible);
        batch.queue().put(Outcome::success(CorrelationId::from_u32(0), 1));
        let first = batch.drain_exact(1).await;

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(batch.report().elapsed, first.elapsed);

        batch.dispatch([2], infallible);
        tokio::time::sleep(Duration::from_secs(1)).await;
        let running = batch.report();
        assert!(running.elapsed >= first.elapsed + Duration::from_secs(6));

        batch.queue().put(Outcome::success(CorrelationId::from_u32(1), 2));
        let second = batch.drain_exact(1).await;
        assert_eq!(second.sent, 2);
        assert!(second.elapsed >= running.elapsed);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(batch.report(), second);
    }

    #[test]
    fn send_single() {
        let batch = Batch::new(Silent, Config::new());
        assert_eq!(batch.send(5).unwrap(), CorrelationId::from_u32(0));
        assert_eq!(batch.send(6).unwrap(), CorrelationId::from_u32(1));
        assert_eq!(batch.counters().sent(), 2);
        assert_eq!(batch.outstanding().len(), 2);
    }
}
