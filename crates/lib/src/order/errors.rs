//! Errors raised by the ordering service.

use thiserror::Error;

use crate::record::RecordId;

/// Errors produced by [`OrderService`](super::OrderService) operations.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum OrderError {
    /// Writing a rebalanced domain failed; nothing was committed.
    #[error("Rebalance of domain {domain} failed: {source}")]
    RebalanceFailed {
        domain: String,
        #[source]
        source: Box<crate::Error>,
    },

    /// A key could not be allocated even after rebalancing.
    #[error("Ordering invariant violated in domain {domain}: {reason}")]
    InvariantViolation { domain: String, reason: String },

    /// The operation needs unique keys but the collection uses buckets.
    #[error("'{operation}' is not supported by non-unique collection '{collection}'")]
    UnsupportedInNonUniqueScope {
        collection: String,
        operation: &'static str,
    },

    /// An item was asked to be placed relative to itself.
    #[error("Item {id} cannot be placed relative to itself")]
    SelfAnchor { id: RecordId },

    /// The same item was listed twice in one move.
    #[error("Item {id} listed more than once")]
    DuplicateItem { id: RecordId },

    /// Items moved together do not share a domain.
    #[error("Item {id} is not in domain {domain}")]
    ItemsInDifferentDomains { id: RecordId, domain: String },

    /// A domain of another collection was passed to this service.
    #[error("Domain belongs to collection '{actual}', expected '{expected}'")]
    WrongCollection { expected: String, actual: String },

    /// The item kept changing domain while the move waited for locks.
    #[error("Item {id} changed domain {attempts} times while being moved")]
    Contention { id: RecordId, attempts: usize },
}

impl OrderError {
    /// Check if this error is a failed rebalance.
    pub fn is_rebalance_failure(&self) -> bool {
        matches!(self, OrderError::RebalanceFailed { .. })
    }

    /// Check if this error points at a bug rather than bad input.
    pub fn is_internal(&self) -> bool {
        matches!(self, OrderError::InvariantViolation { .. })
    }

    /// Check if this error was caused by concurrent writers.
    pub fn is_contention(&self) -> bool {
        matches!(self, OrderError::Contention { .. })
    }

    /// Check if the request itself was invalid.
    pub fn is_invalid_request(&self) -> bool {
        matches!(
            self,
            OrderError::UnsupportedInNonUniqueScope { .. }
                | OrderError::SelfAnchor { .. }
                | OrderError::DuplicateItem { .. }
                | OrderError::ItemsInDifferentDomains { .. }
                | OrderError::WrongCollection { .. }
        )
    }
}

impl From<OrderError> for crate::Error {
    fn from(err: OrderError) -> Self {
        crate::Error::Order(err)
    }
}
