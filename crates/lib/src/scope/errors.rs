//! Domain resolution errors.

use thiserror::Error;

use crate::record::RecordId;

/// Errors raised while working out which ordering domain a record belongs to.
///
/// Every variant is a domain resolution failure: the relation, bucket or
/// anchor the caller referenced is invalid. These are surfaced to the caller
/// and never retried.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ScopeError {
    /// The record carries no value in its grouping field.
    #[error("Collection '{collection}' requires a value in field '{field}'")]
    MissingGroupValue { collection: String, field: String },

    /// The grouping field holds a value of the wrong shape.
    #[error("Invalid value in field '{field}' of collection '{collection}': {reason}")]
    InvalidGroupValue {
        collection: String,
        field: String,
        reason: String,
    },

    /// The bucket value is not an integer.
    #[error("Invalid bucket {value} in field '{field}' of collection '{collection}'")]
    InvalidBucket {
        collection: String,
        field: String,
        value: String,
    },

    /// The related record used as a group does not exist.
    #[error("Related record not found: {collection}/{id}")]
    RelatedRecordNotFound { collection: String, id: RecordId },

    /// A group was given for a collection ordered globally.
    #[error("Collection '{collection}' is ordered globally and has no groups")]
    NotGrouped { collection: String },

    /// A group of the wrong kind was given (relation vs bucket).
    #[error("Collection '{collection}' expects a {expected} group")]
    WrongGroupKind {
        collection: String,
        expected: &'static str,
    },

    /// A placement anchor is not a member of the target domain.
    #[error("Anchor {anchor} is not in domain {domain}")]
    AnchorNotInDomain { anchor: RecordId, domain: String },
}

impl ScopeError {
    /// Every scope error is a domain resolution failure.
    pub fn is_domain_resolution_error(&self) -> bool {
        true
    }

    /// Check if this error is about a record that does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ScopeError::RelatedRecordNotFound { .. })
    }

    /// Check if this error is about a bad placement anchor.
    pub fn is_anchor_error(&self) -> bool {
        matches!(self, ScopeError::AnchorNotInDomain { .. })
    }
}

impl From<ScopeError> for crate::Error {
    fn from(err: ScopeError) -> Self {
        crate::Error::Scope(err)
    }
}
