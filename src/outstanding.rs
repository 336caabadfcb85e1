//! `Outstanding`, the collection of requests awaiting an outcome.
//!
//! The dispatch loop inserts every request right before handing it to the
//! transport and the drain strategies remove it again once its outcome has
//! been taken from the queue. Whatever is left once draining has stopped
//! never returned.

use std::collections::hash_map::{Entry, HashMap};
use std::vec::Vec;

use parking_lot::Mutex;

use crate::id::CorrelationId;

//------------ Outstanding ---------------------------------------------------

/// A collection of requests sent but not yet resolved.
///
/// All methods take `&self` and can be called concurrently.
#[derive(Debug)]
pub struct Outstanding<V> {
    /// A map from correlation identifiers to requests.
    requests: Mutex<HashMap<CorrelationId, V>>,
}

impl<V> Outstanding<V> {
    /// Creates a new, empty collection.
    pub fn new() -> Self {
        Outstanding {
            requests: Mutex::new(HashMap::new()),
        }
    }

    /// Adds a request under the given identifier.
    ///
    /// If the identifier is still in use, the collection is left alone and
    /// the value is handed back.
    pub fn insert(&self, id: CorrelationId, value: V) -> Result<(), V> {
        match self.requests.lock().entry(id) {
            Entry::Vacant(entry) => {
                entry.insert(value);
                Ok(())
            }
            Entry::Occupied(_) => Err(value),
        }
    }

    /// Removes and returns the request with the given identifier.
    pub fn remove(&self, id: CorrelationId) -> Option<V> {
        self.requests.lock().remove(&id)
    }

    /// Returns whether a request with the given identifier is outstanding.
    pub fn contains(&self, id: CorrelationId) -> bool {
        self.requests.lock().contains_key(&id)
    }

    /// Returns the number of outstanding requests.
    pub fn len(&self) -> usize {
        self.requests.lock().len()
    }

    /// Returns whether there are no outstanding requests.
    pub fn is_empty(&self) -> bool {
        self.requests.lock().is_empty()
    }

    /// Returns the identifiers of all outstanding requests in order.
    pub fn ids(&self) -> Vec<CorrelationId> {
        let mut ids: Vec<_> = self.requests.lock().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Removes all outstanding requests and returns them ordered by
    /// identifier.
    pub fn drain(&self) -> Vec<(CorrelationId, V)> {
        let mut res: Vec<_> = self.requests.lock().drain().collect();
        res.sort_unstable_by_key(|(id, _)| *id);
        res
    }
}

impl<V> Default for Outstanding<V> {
    fn default() -> Self {
        Self::new()
    }
}

//============ Tests =========================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn id(value: u32) -> CorrelationId {
        CorrelationId::from_u32(value)
    }

    #[test]
    fn insert_and_remove() {
        let outstanding = Outstanding::new();
        assert!(outstanding.is_empty());
        outstanding.insert(id(1), "one").unwrap();
        outstanding.insert(id(2), "two").unwrap();
        assert_eq!(outstanding.len(), 2);
        assert!(outstanding.contains(id(1)));

        assert_eq!(outstanding.remove(id(1)), Some("one"));
        assert_eq!(outstanding.remove(id(1)), None);
        assert!(!outstanding.contains(id(1)));
        assert_eq!(outstanding.len(), 1);
    }

    #[test]
    fn duplicate_id_is_refused() {
        let outstanding = Outstanding::new();
        outstanding.insert(id(1), "first").unwrap();
        assert_eq!(outstanding.insert(id(1), "second"), Err("second"));
        assert_eq!(outstanding.remove(id(1)), Some("first"));
    }

    #[test]
    fn drain_is_sorted() {
        let outstanding = Outstanding::new();
        for value in [5, 3, 9, 1] {
            outstanding.insert(id(value), value).unwrap();
        }
        assert_eq!(outstanding.ids(), vec![id(1), id(3), id(5), id(9)]);
        assert_eq!(
            outstanding.drain(),
            vec![(id(1), 1), (id(3), 3), (id(5), 5), (id(9), 9)]
        );
        assert!(outstanding.is_empty());
    }
}
