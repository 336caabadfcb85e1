//! Composing DNS queries.
//!
//! [`QueryComposer`] turns domain names given in presentation format, e.g.,
//! lines read from a file, into DNS query messages that can be dispatched
//! as part of a [`Batch`][crate::Batch]. A name that cannot be parsed is
//! reported as an error for that one item only.
//!
//! ```
//! use domain_bulk::dns::QueryComposer;
//! use domain_bulk::CorrelationId;
//!
//! let composer = QueryComposer::new();
//! let query = composer.compose("example.com", CorrelationId::from(12));
//! assert_eq!(query.unwrap().header().id(), 12);
//! assert!(composer.compose("bad..name", CorrelationId::from(13)).is_err());
//! ```

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::vec::Vec;

use bytes::Bytes;
use domain::base::iana::{Class, Rtype};
use domain::base::message_builder::PushError;
use domain::base::name::FromStrError;
use domain::base::{Message, MessageBuilder, Name, Question};

use crate::id::CorrelationId;

//------------ QueryComposer -------------------------------------------------

/// Builds DNS query messages for domain names.
///
/// Every message gets a single question for the name with the configured
/// QTYPE and QCLASS. The message ID is set to the lower 16 bits of the
/// correlation identifier.
#[derive(Clone, Copy, Debug)]
pub struct QueryComposer {
    /// The QTYPE of the question.
    qtype: Rtype,

    /// The QCLASS of the question.
    qclass: Class,

    /// Whether to set the RD bit.
    recursion_desired: bool,
}

impl QueryComposer {
    /// Creates a composer for A queries of class ANY with the RD bit set.
    pub fn new() -> Self {
        Default::default()
    }

    /// Returns the QTYPE of the queries.
    pub fn qtype(&self) -> Rtype {
        self.qtype
    }

    /// Sets the QTYPE of the queries.
    pub fn set_qtype(&mut self, qtype: Rtype) {
        self.qtype = qtype
    }

    /// Returns the QCLASS of the queries.
    pub fn qclass(&self) -> Class {
        self.qclass
    }

    /// Sets the QCLASS of the queries.
    pub fn set_qclass(&mut self, qclass: Class) {
        self.qclass = qclass
    }

    /// Returns whether the RD bit is set in the queries.
    pub fn recursion_desired(&self) -> bool {
        self.recursion_desired
    }

    /// Sets whether the RD bit is set in the queries.
    pub fn set_recursion_desired(&mut self, value: bool) {
        self.recursion_desired = value
    }

    /// Builds the query for a name.
    ///
    /// Leading and trailing white space is ignored. The name is always
    /// taken as absolute.
    pub fn compose(
        &self,
        name: &str,
        id: CorrelationId,
    ) -> Result<Message<Bytes>, QueryError> {
        let qname = Name::<Vec<u8>>::from_str(name.trim())?;
        let mut msg = MessageBuilder::new_bytes();
        msg.header_mut().set_id(id.to_message_id());
        msg.header_mut().set_rd(self.recursion_desired);
        let mut msg = msg.question();
        msg.push(Question::new(qname, self.qtype, self.qclass))?;
        Ok(msg.into_message())
    }
}

impl Default for QueryComposer {
    fn default() -> Self {
        QueryComposer {
            qtype: Rtype::A,
            qclass: Class::ANY,
            recursion_desired: true,
        }
    }
}

//------------ QueryError ----------------------------------------------------

/// A query could not be built.
#[derive(Clone, Debug)]
pub enum QueryError {
    /// The name is not a valid domain name.
    BadName(FromStrError),

    /// The question did not fit into the message.
    Push(PushError),
}

impl From<FromStrError> for QueryError {
    fn from(err: FromStrError) -> Self {
        QueryError::BadName(err)
    }
}

impl From<PushError> for QueryError {
    fn from(err: PushError) -> Self {
        QueryError::Push(err)
    }
}

impl Display for QueryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            QueryError::BadName(err) => write!(f, "invalid name: {err}"),
            QueryError::Push(err) => write!(f, "cannot build query: {err}"),
        }
    }
}

impl error::Error for QueryError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            QueryError::BadName(err) => Some(err),
            QueryError::Push(err) => Some(err),
        }
    }
}

//============ Tests =========================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::string::ToString;

    #[test]
    fn composes_query() {
        let composer = QueryComposer::new();
        let msg = composer
            .compose(" www.example.com \n", CorrelationId::from_u32(0x1_0042))
            .unwrap();

        assert_eq!(msg.header().id(), 0x42);
        assert!(msg.header().rd());
        assert!(!msg.header().qr());
        assert_eq!(msg.header_counts().qdcount(), 1);

        let question = msg.sole_question().unwrap();
        assert_eq!(question.qtype(), Rtype::A);
        assert_eq!(question.qclass(), Class::ANY);
        assert_eq!(
            question.qname().to_string().trim_end_matches('.'),
            "www.example.com"
        );
    }

    #[test]
    fn honours_settings() {
        let mut composer = QueryComposer::new();
        composer.set_qtype(Rtype::AAAA);
        composer.set_qclass(Class::IN);
        composer.set_recursion_desired(false);
        let msg = composer
            .compose("example.org.", CorrelationId::from_u32(7))
            .unwrap();

        assert!(!msg.header().rd());
        let question = msg.sole_question().unwrap();
        assert_eq!(question.qtype(), Rtype::AAAA);
        assert_eq!(question.qclass(), Class::IN);
    }

    #[test]
    fn rejects_malformed_names() {
        let composer = QueryComposer::new();
        let id = CorrelationId::from_u32(1);
        assert!(matches!(
            composer.compose("bad..example.com", id),
            Err(QueryError::BadName(_))
        ));
        let long_label = "a".repeat(64) + ".example.com";
        assert!(matches!(
            composer.compose(&long_label, id),
            Err(QueryError::BadName(_))
        ));
    }
}
