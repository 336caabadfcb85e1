//! Correlation identifiers.
//!
//! Every request dispatched as part of a batch receives a [`CorrelationId`]
//! from the batch’s [`IdGenerator`]. The transport hands the identifier
//! back with the outcome of the request, which is what allows the outcome
//! to be matched to the request that caused it.

use core::fmt;
use core::sync::atomic::{AtomicU32, Ordering};

//------------ CorrelationId -------------------------------------------------

/// The identifier linking a sent request to its eventual outcome.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CorrelationId(u32);

impl CorrelationId {
    /// Creates an identifier from its integer value.
    #[must_use]
    pub const fn from_u32(value: u32) -> Self {
        CorrelationId(value)
    }

    /// Returns the integer value of the identifier.
    #[must_use]
    pub const fn to_u32(self) -> u32 {
        self.0
    }

    /// Returns the identifier truncated to a DNS message ID.
    ///
    /// DNS message IDs only have 16 bits, so identifiers that are
    /// 65536 apart map to the same message ID.
    #[must_use]
    pub const fn to_message_id(self) -> u16 {
        self.0 as u16
    }
}

//--- From

impl From<u32> for CorrelationId {
    fn from(value: u32) -> Self {
        CorrelationId(value)
    }
}

impl From<CorrelationId> for u32 {
    fn from(id: CorrelationId) -> Self {
        id.0
    }
}

//--- Display

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

//------------ IdStart -------------------------------------------------------

/// Where an [`IdGenerator`] starts counting.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum IdStart {
    /// Start at zero.
    #[default]
    Zero,

    /// Start at the given value.
    At(u32),

    /// Start at a random value.
    ///
    /// Useful when the identifier ends up on the wire, e.g., as a DNS
    /// message ID, and should not be predictable.
    Random,
}

impl IdStart {
    /// Returns the first value for this start policy.
    fn initial(self) -> u32 {
        match self {
            IdStart::Zero => 0,
            IdStart::At(value) => value,
            IdStart::Random => rand::random(),
        }
    }
}

//------------ IdGenerator ---------------------------------------------------

/// A source of unique correlation identifiers.
///
/// The generator is a monotonic counter that can be shared between
/// threads. Identifiers are unique until the 32 bit counter wraps around,
/// i.e., for the first 2³² identifiers handed out. Nothing is promised
/// about how the order of identifiers relates to the order in which
/// requests complete.
#[derive(Debug)]
pub struct IdGenerator {
    /// The next identifier to hand out.
    next: AtomicU32,

    /// The first identifier handed out.
    first: u32,
}

impl IdGenerator {
    /// Creates a new generator starting at the given position.
    pub fn new(start: IdStart) -> Self {
        let first = start.initial();
        IdGenerator {
            next: AtomicU32::new(first),
            first,
        }
    }

    /// Returns a new, unique identifier.
    pub fn next(&self) -> CorrelationId {
        CorrelationId(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the number of identifiers handed out so far.
    pub fn issued(&self) -> u32 {
        self.next.load(Ordering::Relaxed).wrapping_sub(self.first)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new(IdStart::Zero)
    }
}

//============ Tests =========================================================
