//! The dispatch loop.
//!
//! Dispatching turns input items into requests and hands them to the
//! transport one after another. It never waits for a response, so the
//! time it takes only depends on how quickly requests can be built and
//! handed off. An item that cannot be turned into a request is recorded
//! and skipped; it never stops the rest of the batch.

use std::error;
use std::vec::Vec;

use tracing::{debug, trace, warn};

use crate::error::Error;
use crate::id::{CorrelationId, IdGenerator};
use crate::ledger::Ledger;
use crate::queue::ResultQueue;
use crate::request::Request;
use crate::transport::Transport;

//------------ Dispatched ----------------------------------------------------

/// What happened while dispatching a sequence of items.
#[derive(Clone, Debug, Default)]
pub struct Dispatched {
    /// The number of requests handed to the transport.
    pub sent: usize,

    /// The items that could not be dispatched.
    pub failures: Vec<ItemFailure>,
}

impl Dispatched {
    /// Returns the number of items looked at.
    pub fn total(&self) -> usize {
        self.sent + self.failures.len()
    }
}

//------------ ItemFailure ---------------------------------------------------

/// An item that could not be dispatched.
#[derive(Clone, Debug)]
pub struct ItemFailure {
    /// The position of the item in the input sequence.
    pub index: usize,

    /// The correlation identifier that was assigned to the item.
    pub id: CorrelationId,

    /// What went wrong.
    pub error: Error,
}

//------------ dispatch ------------------------------------------------------

/// Dispatches a sequence of items.
///
/// For each item, a fresh identifier is taken from `ids` and `compose` is
/// asked to build the request’s payload. The request is then recorded as
/// outstanding and handed to the transport.
pub(crate) fn dispatch<X, I, F, C>(
    transport: &X,
    ids: &IdGenerator,
    queue: &ResultQueue<X::Response, X::Failure>,
    ledger: &Ledger<X::Payload, X::Response, X::Failure>,
    items: I,
    mut compose: F,
) -> Dispatched
where
    X: Transport,
    X::Payload: Clone,
    I: IntoIterator,
    F: FnMut(I::Item, CorrelationId) -> Result<X::Payload, C>,
    C: Into<Box<dyn error::Error + Send + Sync>>,
{
    let mut res = Dispatched::default();
    for (index, item) in items.into_iter().enumerate() {
        let id = ids.next();
        let sent = compose(item, id)
            .map_err(Error::compose)
            .and_then(|payload| {
                send(transport, queue, ledger, Request::new(id, payload))
            });
        match sent {
            Ok(()) => res.sent += 1,
            Err(error) => {
                warn!(index, %id, %error, "item not dispatched");
                ledger.counters().inc_rejected();
                res.failures.push(ItemFailure { index, id, error });
            }
        }
    }
    debug!(
        sent = res.sent,
        failed = res.failures.len(),
        "dispatched items"
    );
    res
}

/// Records a request as outstanding and hands it to the transport.
///
/// If the transport refuses the request, it is withdrawn again.
pub(crate) fn send<X>(
    transport: &X,
    queue: &ResultQueue<X::Response, X::Failure>,
    ledger: &Ledger<X::Payload, X::Response, X::Failure>,
    request: Request<X::Payload>,
) -> Result<(), Error>
where
    X: Transport,
    X::Payload: Clone,
{
    let id = request.id();

    // The request has to be outstanding before the transport sees it since
    // its outcome may arrive before send_async even returns.
    ledger
        .record(request.clone())
        .map_err(|_| Error::DuplicateId(id))?;
    if let Err(err) = transport.send_async(request, queue) {
        ledger.withdraw(id);
        return Err(err.into());
    }
    ledger.counters().inc_sent();
    trace!(%id, "sent request");
    Ok(())
}

//============ Tests =========================================================
