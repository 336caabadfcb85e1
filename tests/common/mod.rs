//! Helpers shared by the integration tests.

#![allow(dead_code)]

use std::time::Duration;

use domain_bulk::{
    CorrelationId, Outcome, Rejected, Request, ResultQueue, Transport,
};
use tracing_subscriber::EnvFilter;

/// Setup logging of events reported by the crate and the test suite.
///
/// Use the RUST_LOG environment variable to override the defaults.
///
/// E.g. To enable debug level logging:
///   RUST_LOG=DEBUG
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_thread_ids(true)
        .without_time()
        .try_init()
        .ok();
}

//------------ Plan ----------------------------------------------------------

/// What a [`StubTransport`] does with a request.
pub enum Plan<R, E> {
    /// Publish a successful outcome.
    Answer(R),

    /// Publish a failed outcome.
    Fail(E),

    /// Accept the request but never publish anything.
    Lose,

    /// Refuse the request right away.
    Reject,
}

//------------ StubTransport -------------------------------------------------

/// Type of the function deciding what to do with a request.
type PlanFn<T, R, E> = dyn Fn(&Request<T>) -> Plan<R, E> + Send + Sync;

/// Type of the function deciding how long a request takes.
type DelayFn = dyn Fn(CorrelationId) -> Duration + Send + Sync;

/// A transport publishing scripted outcomes from spawned tasks.
pub struct StubTransport<T, R, E> {
    plan: Box<PlanFn<T, R, E>>,
    delay: Box<DelayFn>,
}

impl<T, R, E> StubTransport<T, R, E> {
    pub fn new(
        plan: impl Fn(&Request<T>) -> Plan<R, E> + Send + Sync + 'static,
    ) -> Self {
        StubTransport {
            plan: Box::new(plan),
            delay: Box::new(|_| Duration::from_millis(10)),
        }
    }

    pub fn with_delay(
        mut self,
        delay: impl Fn(CorrelationId) -> Duration + Send + Sync + 'static,
    ) -> Self {
        self.delay = Box::new(delay);
        self
    }
}

impl<T, R, E> Transport for StubTransport<T, R, E>
where
    R: Send + 'static,
    E: Send + 'static,
{
    type Payload = T;
    type Response = R;
    type Failure = E;

    fn send_async(
        &self,
        request: Request<T>,
        queue: &ResultQueue<R, E>,
    ) -> Result<(), Rejected> {
        let id = request.id();
        let outcome = match (self.plan)(&request) {
            Plan::Answer(response) => Outcome::success(id, response),
            Plan::Fail(cause) => Outcome::failure(id, cause),
            Plan::Lose => return Ok(()),
            Plan::Reject => return Err(Rejected::new("stub says no")),
        };
        let delay = (self.delay)(id);
        let queue = queue.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            queue.put(outcome);
        });
        Ok(())
    }
}
