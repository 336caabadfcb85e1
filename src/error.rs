//! Error types.

#![warn(clippy::missing_docs_in_private_items)]

use std::borrow::Cow;
use std::error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use crate::id::CorrelationId;

//------------ Error ---------------------------------------------------------

/// Why a single item of a batch could not be dispatched.
///
/// These errors only ever concern one item. They are collected by the
/// dispatch loop and never abort the batch.
#[derive(Clone, Debug)]
pub enum Error {
    /// The payload for the item could not be constructed.
    Compose(Arc<dyn error::Error + Send + Sync>),

    /// The transport refused to take the request.
    Rejected(Rejected),

    /// The correlation identifier is still in use by an earlier request.
    DuplicateId(CorrelationId),
}

impl Error {
    /// Creates a compose error from anything that can be boxed as an error.
    pub fn compose(
        err: impl Into<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Compose(Arc::from(err.into()))
    }

    /// Returns whether the error happened while building the payload.
    pub fn is_compose(&self) -> bool {
        matches!(self, Error::Compose(_))
    }
}

impl From<Rejected> for Error {
    fn from(err: Rejected) -> Self {
        Error::Rejected(err)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            Error::Compose(err) => write!(f, "malformed request: {err}"),
            Error::Rejected(err) => Display::fmt(err, f),
            Error::DuplicateId(id) => {
                write!(f, "correlation id {id} is still outstanding")
            }
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Compose(err) => Some(err.as_ref()),
            Error::Rejected(err) => Some(err),
            Error::DuplicateId(_) => None,
        }
    }
}

//------------ Rejected ------------------------------------------------------

/// A transport refused a request synchronously.
///
/// A rejected request never produces an outcome.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Rejected {
    /// Why the request was refused.
    reason: Cow<'static, str>,
}

impl Rejected {
    /// Creates a new value from the reason for the rejection.
    pub fn new(reason: impl Into<Cow<'static, str>>) -> Self {
        Rejected {
            reason: reason.into(),
        }
    }

    /// Returns the reason for the rejection.
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl Display for Rejected {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "request rejected by transport: {}", self.reason)
    }
}

impl error::Error for Rejected {}

//------------ TimedOut ------------------------------------------------------

/// Waiting for an outcome reached its deadline.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TimedOut;

impl Display for TimedOut {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        f.write_str("timed out waiting for an outcome")
    }
}

impl error::Error for TimedOut {}
