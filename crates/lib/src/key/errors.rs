//! Error types for order key handling.

use thiserror::Error;

/// Errors produced while parsing or allocating order keys.
///
/// `NoMidpoint`, `ExceedsPrecision`, `MissingKey` and `SharedKey` are
/// recoverable signals: the allocator
/// absorbs them by rebalancing the domain. The remaining variants describe
/// invalid input and are surfaced unchanged.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum KeyError {
    /// No representable key lies strictly between the two neighbours.
    #[error("No midpoint between {prev:?} and {next:?} at {length} digits")]
    NoMidpoint {
        /// Lower neighbour, absent at the start of the domain
        prev: Option<String>,
        /// Upper neighbour, absent at the end of the domain
        next: Option<String>,
        /// Precision budget of the key space
        length: usize,
    },

    /// A stored key carries more digits than the key space allows.
    #[error("Key '{key}' exceeds the key space precision of {length} digits")]
    ExceedsPrecision { key: String, length: usize },

    /// A neighbour of the insertion point has no usable key yet.
    #[error("Neighbour '{id}' has no order key")]
    MissingKey { id: String },

    /// Both neighbours of the insertion point store the same key.
    #[error("Neighbours '{prev}' and '{next}' share order key '{key}'")]
    SharedKey {
        prev: String,
        next: String,
        key: String,
    },

    /// The lower neighbour does not sort before the upper neighbour.
    #[error("Keys out of order: '{prev}' must sort before '{next}'")]
    OutOfOrder { prev: String, next: String },

    /// The string is not a valid order key.
    #[error("Invalid order key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    /// The requested precision cannot be represented.
    #[error("Invalid key length {length}: must be between 1 and {max}")]
    InvalidLength { length: usize, max: usize },

    /// Too many items to spread with room between every neighbour.
    #[error("Cannot spread {items} keys: key space holds at most {capacity}")]
    CapacityExceeded { items: usize, capacity: u128 },
}

impl KeyError {
    /// Check if this error is repaired by rebalancing the domain.
    pub fn requires_rebalance(&self) -> bool {
        matches!(
            self,
            KeyError::NoMidpoint { .. }
                | KeyError::ExceedsPrecision { .. }
                | KeyError::MissingKey { .. }
                | KeyError::SharedKey { .. }
        )
    }

    /// Check if this error is the exhausted-precision signal.
    pub fn is_no_midpoint(&self) -> bool {
        matches!(self, KeyError::NoMidpoint { .. })
    }

    /// Check if this error was caused by malformed input.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            KeyError::InvalidKey { .. } | KeyError::InvalidLength { .. } | KeyError::OutOfOrder { .. }
        )
    }

    /// Check if the key space is too small for the domain.
    pub fn is_capacity_error(&self) -> bool {
        matches!(self, KeyError::CapacityExceeded { .. })
    }
}

impl From<KeyError> for crate::Error {
    fn from(err: KeyError) -> Self {
        crate::Error::Key(err)
    }
}
