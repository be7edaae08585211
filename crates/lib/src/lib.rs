//!
//! Orderable: user-controlled display order for records in a document store.
//! This library provides the components for placing, moving and listing records
//! in an order chosen by the user rather than derived from their content.
//!
//! ## Core Concepts
//!
//! * **Order keys (`key::OrderKey`)**: Fractional base-62 strings whose plain string
//!   order is the display order. A new key can always be synthesised between two
//!   neighbours until the precision budget of the `key::KeySpace` runs out.
//! * **Records (`record::Record`)**: Opaque documents owned by a store. The engine only
//!   reads and writes the order field and the grouping field.
//! * **Backends (`backend::BackendImpl`)**: A pluggable record store with atomic batches.
//! * **Scopes (`scope::GroupScope`)**: Decide which records are ordered relative to each
//!   other. A collection is ordered globally, per related record, or by integer buckets.
//! * **Ordering service (`order::OrderService`)**: Inserts, moves, lists and rebalances
//!   items, serializing writers per ordering domain.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use orderable::{
//!     backend::database::InMemory,
//!     order::{CollectionConfig, OrderService, Placement},
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> orderable::Result<()> {
//! let service = OrderService::new(Arc::new(InMemory::new()), CollectionConfig::new("posts"))?;
//! let a = service.insert(Default::default(), Placement::End).await?;
//! let b = service.insert(Default::default(), Placement::End).await?;
//! service.move_item(&b.id, Placement::Before(a.id.clone())).await?;
//!
//! let order: Vec<_> = service.list_ordered(&a.domain).await?.map(|i| i.record.id).collect();
//! assert_eq!(order, vec![b.id, a.id]);
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod clock;
pub mod constants;
pub mod fixtures;
pub mod key;
pub mod order;
pub mod record;
pub mod scope;

pub use clock::{Clock, ClockHold, FixedClock, SystemClock};
pub use key::{KeySpace, OrderKey};
pub use order::{CollectionConfig, OrderService, Placement};
pub use record::{Record, RecordId};
pub use scope::{GroupKey, OrderingDomain};

/// Result type used throughout the Orderable library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the Orderable library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Structured record store errors from the backend module
    #[error(transparent)]
    Backend(backend::BackendError),

    /// Structured order key errors from the key module
    #[error(transparent)]
    Key(key::KeyError),

    /// Structured domain resolution errors from the scope module
    #[error(transparent)]
    Scope(scope::ScopeError),

    /// Structured ordering errors from the order module
    #[error(transparent)]
    Order(order::OrderError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Backend(_) => "backend",
            Error::Key(_) => "key",
            Error::Scope(_) => "scope",
            Error::Order(_) => "order",
            Error::Io(_) => "io",
            Error::Serialize(_) => "serialize",
        }
    }

    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Backend(backend_err) => backend_err.is_not_found(),
            Error::Scope(scope_err) => scope_err.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error indicates a conflict (already exists).
    pub fn is_conflict(&self) -> bool {
        match self {
            Error::Backend(backend_err) => backend_err.is_conflict(),
            _ => false,
        }
    }

    /// Check if the caller referenced an invalid group, bucket or anchor.
    pub fn is_domain_resolution_error(&self) -> bool {
        match self {
            Error::Scope(scope_err) => scope_err.is_domain_resolution_error(),
            _ => false,
        }
    }

    /// Check if a rebalance could not be written.
    pub fn is_rebalance_failure(&self) -> bool {
        match self {
            Error::Order(order_err) => order_err.is_rebalance_failure(),
            _ => false,
        }
    }

    /// Check if this error is store-related.
    pub fn is_store_error(&self) -> bool {
        matches!(self, Error::Backend(_))
    }

    /// Check if this error indicates a data integrity issue.
    pub fn is_integrity_error(&self) -> bool {
        match self {
            Error::Backend(backend_err) => backend_err.is_integrity_error(),
            _ => false,
        }
    }

    /// Check if this error is I/O related.
    pub fn is_io_error(&self) -> bool {
        match self {
            Error::Io(_) => true,
            Error::Backend(backend_err) => backend_err.is_io_error(),
            _ => false,
        }
    }

    /// Check if the request itself was invalid.
    pub fn is_invalid_request(&self) -> bool {
        match self {
            Error::Key(key_err) => key_err.is_invalid_input(),
            Error::Order(order_err) => order_err.is_invalid_request(),
            _ => false,
        }
    }

    /// Check if the key space is too small for a domain.
    pub fn is_capacity_error(&self) -> bool {
        match self {
            Error::Key(key_err) => key_err.is_capacity_error(),
            _ => false,
        }
    }

    /// Check if this error is related to concurrency issues.
    pub fn is_concurrency_error(&self) -> bool {
        match self {
            Error::Order(order_err) => order_err.is_contention(),
            _ => false,
        }
    }

    /// Check if this error indicates a bug rather than bad input.
    pub fn is_internal(&self) -> bool {
        match self {
            Error::Order(order_err) => order_err.is_internal(),
            _ => false,
        }
    }
}
