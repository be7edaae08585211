//! Record store error types.
//!
//! This module defines structured error types for record store operations.
//! These map to the generic "store error" of the ordering engine: they are
//! propagated unchanged to the caller and never retried internally.

use thiserror::Error;

use crate::record::RecordId;

/// Errors that can occur inside a record store backend.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Existing variants will not be removed in minor versions
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum BackendError {
    /// Record not found by id.
    #[error("Record not found: {collection}/{id}")]
    RecordNotFound {
        /// Collection the lookup ran against
        collection: String,
        /// The id that was not found
        id: RecordId,
    },

    /// A record with the same id already exists.
    #[error("Record already exists: {collection}/{id}")]
    RecordAlreadyExists {
        /// Collection of the conflicting record
        collection: String,
        /// The conflicting id
        id: RecordId,
    },

    /// A batch was rejected and none of its writes were applied.
    #[error("Batch of {ops} writes rejected: {reason}")]
    BatchRejected {
        /// Number of operations in the rejected batch
        ops: usize,
        /// Why the batch was rejected
        reason: String,
    },

    /// Stored record data is not a JSON object.
    #[error("Corrupt record {collection}/{id}: {reason}")]
    CorruptRecord {
        /// Collection of the record
        collection: String,
        /// Id of the record
        id: RecordId,
        /// Description of the corruption
        reason: String,
    },

    /// Serialization failed.
    #[error("Serialization failed")]
    SerializationFailed {
        /// The underlying serialization error
        #[source]
        source: serde_json::Error,
    },

    /// Deserialization failed.
    #[error("Deserialization failed")]
    DeserializationFailed {
        /// The underlying deserialization error
        #[source]
        source: serde_json::Error,
    },

    /// File I/O error.
    #[error("File I/O error")]
    FileIo {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// SQL backend error.
    #[cfg(any(feature = "sqlite", feature = "postgres"))]
    #[error("SQL error: {reason}")]
    SqlxError {
        /// Context for the failure
        reason: String,
        /// The underlying sqlx error, when there is one
        #[source]
        source: Option<sqlx::Error>,
    },
}

impl BackendError {
    /// Check if this error indicates a record was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, BackendError::RecordNotFound { .. })
    }

    /// Check if this error indicates a conflicting write.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            BackendError::RecordAlreadyExists { .. } | BackendError::BatchRejected { .. }
        )
    }

    /// Check if this error is related to I/O or encoding.
    pub fn is_io_error(&self) -> bool {
        matches!(
            self,
            BackendError::FileIo { .. }
                | BackendError::SerializationFailed { .. }
                | BackendError::DeserializationFailed { .. }
        )
    }

    /// Check if this error indicates damaged stored data.
    pub fn is_integrity_error(&self) -> bool {
        matches!(self, BackendError::CorruptRecord { .. })
    }

    /// Get the record id if this error is about a specific record.
    pub fn record_id(&self) -> Option<&RecordId> {
        match self {
            BackendError::RecordNotFound { id, .. }
            | BackendError::RecordAlreadyExists { id, .. }
            | BackendError::CorruptRecord { id, .. } => Some(id),
            _ => None,
        }
    }
}

impl From<BackendError> for crate::Error {
    fn from(err: BackendError) -> Self {
        crate::Error::Backend(err)
    }
}
