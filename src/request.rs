//! Requests and their outcomes.

use crate::id::CorrelationId;

//------------ Request -------------------------------------------------------

/// A unit of work handed to a transport.
///
/// A request is an opaque payload together with the correlation
/// identifier assigned to it at dispatch. It is not changed after it has
/// been sent.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Request<T> {
    /// The correlation identifier assigned to the request.
    id: CorrelationId,

    /// What is to be sent.
    payload: T,
}

impl<T> Request<T> {
    /// Creates a new request.
    pub fn new(id: CorrelationId, payload: T) -> Self {
        Request { id, payload }
    }

    /// Returns the correlation identifier of the request.
    pub fn id(&self) -> CorrelationId {
        self.id
    }

    /// Returns a reference to the payload.
    pub fn payload(&self) -> &T {
        &self.payload
    }

    /// Converts the request into its payload.
    pub fn into_payload(self) -> T {
        self.payload
    }

    /// Converts the request into its identifier and payload.
    pub fn into_parts(self) -> (CorrelationId, T) {
        (self.id, self.payload)
    }
}

//------------ Outcome -------------------------------------------------------

/// The outcome of a request as published by a transport.
///
/// Transports produce exactly one outcome per accepted request. A failure
/// is a regular outcome, not an error of the harness.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Outcome<R, E> {
    /// The request was answered.
    Success {
        /// The identifier of the request this answers.
        id: CorrelationId,

        /// The response.
        response: R,
    },

    /// The request failed, e.g., because it timed out.
    Failure {
        /// The identifier of the request that failed.
        id: CorrelationId,

        /// Why it failed.
        cause: E,
    },
}

impl<R, E> Outcome<R, E> {
    /// Creates a successful outcome.
    pub fn success(id: CorrelationId, response: R) -> Self {
        Outcome::Success { id, response }
    }

    /// Creates a failed outcome.
    pub fn failure(id: CorrelationId, cause: E) -> Self {
        Outcome::Failure { id, cause }
    }

    /// Creates an outcome from a result.
    pub fn from_result(id: CorrelationId, result: Result<R, E>) -> Self {
        match result {
            Ok(response) => Outcome::Success { id, response },
            Err(cause) => Outcome::Failure { id, cause },
        }
    }

    /// Returns the identifier of the request this is the outcome of.
    pub fn id(&self) -> CorrelationId {
        match *self {
            Outcome::Success { id, .. } | Outcome::Failure { id, .. } => id,
        }
    }

    /// Returns whether this is a successful outcome.
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    /// Returns whether this is a failed outcome.
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure { .. })
    }

    /// Converts the outcome into a result, dropping the identifier.
    pub fn into_result(self) -> Result<R, E> {
        match self {
            Outcome::Success { response, .. } => Ok(response),
            Outcome::Failure { cause, .. } => Err(cause),
        }
    }
}

//============ Tests =========================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_accessors() {
        let id = CorrelationId::from_u32(7);
        let good: Outcome<&str, ()> = Outcome::success(id, "answer");
        assert_eq!(good.id(), id);
        assert!(good.is_success());
        assert!(!good.is_failure());
        assert_eq!(good.into_result(), Ok("answer"));

        let bad: Outcome<(), &str> = Outcome::from_result(id, Err("timeout"));
        assert_eq!(bad.id(), id);
        assert!(bad.is_failure());
        assert_eq!(bad.into_result(), Err("timeout"));
    }

    #[test]
    fn request_parts() {
        let request = Request::new(CorrelationId::from_u32(3), "example.com");
        assert_eq!(request.id().to_u32(), 3);
        assert_eq!(*request.payload(), "example.com");
        assert_eq!(
            request.into_parts(),
            (CorrelationId::from_u32(3), "example.com")
        );
    }
}
