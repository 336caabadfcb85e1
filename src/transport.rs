//! The interface to the transport that actually sends requests.
//!
//! The harness does not know how a request travels to its destination or
//! how a response finds its way back. All it needs is something that
//! implements [`Transport`]: a way to hand off a request without waiting
//! and the promise that the outcome of the request will eventually show up
//! in the [`ResultQueue`] given along with it.

use crate::error::Rejected;
use crate::queue::ResultQueue;
use crate::request::Request;

//------------ Transport -----------------------------------------------------

/// A transport for sending requests asynchronously.
pub trait Transport {
    /// The payload of the requests the transport sends.
    type Payload;

    /// The response the transport produces for a successful request.
    type Response;

    /// The cause the transport reports for a failed request.
    type Failure;

    /// Starts sending a request.
    ///
    /// The method must not wait for the request to complete. Instead, the
    /// transport publishes exactly one outcome for the request into
    /// `queue` once it has completed, using the request’s correlation
    /// identifier. If the transport has its own timeout, a request that
    /// timed out must be published as a failure.
    ///
    /// If the transport cannot take the request at all, it returns an
    /// error right away and must not publish an outcome.
    fn send_async(
        &self,
        request: Request<Self::Payload>,
        queue: &ResultQueue<Self::Response, Self::Failure>,
    ) -> Result<(), Rejected>;
}

impl<X: Transport + ?Sized> Transport for &X {
    type Payload = X::Payload;
    type Response = X::Response;
    type Failure = X::Failure;

    fn send_async(
        &self,
        request: Request<Self::Payload>,
        queue: &ResultQueue<Self::Response, Self::Failure>,
    ) -> Result<(), Rejected> {
        (**self).send_async(request, queue)
    }
}

impl<X: Transport + ?Sized> Transport for std::sync::Arc<X> {
    type Payload = X::Payload;
    type Response = X::Response;
    type Failure = X::Failure;

    fn send_async(
        &self,
        request: Request<Self::Payload>,
        queue: &ResultQueue<Self::Response, Self::Failure>,
    ) -> Result<(), Rejected> {
        (**self).send_async(request, queue)
    }
}
