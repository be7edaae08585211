//! Ordering domains and the scopes that resolve them.
//!
//! An [`OrderingDomain`] is the set of records whose order keys are compared
//! with each other. A collection picks one [`GroupScope`] which decides how a
//! record maps to its domain:
//!
//! - [`Global`]: the whole collection is one domain.
//! - [`JoinScoped`]: records are grouped by the related record referenced in a
//!   relation field. Each related record owns an independent domain.
//! - [`NonUnique`]: records carry a small integer bucket instead of a key.
//!   Order is by bucket, then by creation time.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    Result,
    backend::BackendImpl,
    record::{Filter, Patch, RecordId},
};

pub mod errors;

pub use errors::ScopeError;

/// Identifies one group inside a collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum GroupKey {
    /// Records sharing a related record
    Relation(RecordId),
    /// Records sharing a bucket number
    Bucket(i64),
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Relation(id) => write!(f, "rel:{id}"),
            GroupKey::Bucket(n) => write!(f, "bucket:{n}"),
        }
    }
}

/// A set of records ordered relative to each other.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderingDomain {
    pub collection: String,
    pub group: Option<GroupKey>,
}

impl OrderingDomain {
    /// The single domain of a globally ordered collection.
    pub fn global(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            group: None,
        }
    }

    /// The domain of records related to `related`.
    pub fn relation(collection: impl Into<String>, related: impl Into<RecordId>) -> Self {
        Self {
            collection: collection.into(),
            group: Some(GroupKey::Relation(related.into())),
        }
    }

    /// The domain of one bucket.
    pub fn bucket(collection: impl Into<String>, bucket: i64) -> Self {
        Self {
            collection: collection.into(),
            group: Some(GroupKey::Bucket(bucket)),
        }
    }
}

impl fmt::Display for OrderingDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.group {
            Some(group) => write!(f, "{}[{group}]", self.collection),
            None => write!(f, "{}", self.collection),
        }
    }
}

/// How items inside a domain are told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderingMode {
    /// Every item carries its own order key
    Unique,
    /// Items carry a shared bucket number; ties break on creation time
    NonUnique,
}

/// Maps records to ordering domains for one collection.
///
/// Resolution is split in two: [`group_of`](GroupScope::group_of) is a pure
/// read of the record's fields, and
/// [`validate_group`](GroupScope::validate_group) checks the group against
/// the store. Inserts and cross-group moves validate; moves inside an
/// existing group only read.
#[async_trait]
pub trait GroupScope: Send + Sync + fmt::Debug {
    /// Whether items carry unique keys or shared buckets.
    fn mode(&self) -> OrderingMode;

    /// Reads the group a document belongs to.
    ///
    /// # Returns
    /// `None` for globally ordered collections.
    fn group_of(&self, collection: &str, data: &Map<String, Value>) -> Result<Option<GroupKey>>;

    /// Checks that a group can hold records.
    async fn validate_group(
        &self,
        backend: &dyn BackendImpl,
        collection: &str,
        group: &GroupKey,
    ) -> Result<()>;

    /// Store filter selecting every member of a domain.
    fn domain_filter(&self, domain: &OrderingDomain) -> Result<Filter>;

    /// Field updates that move a record into a group.
    fn group_patch(&self, collection: &str, group: &GroupKey) -> Result<Patch>;

    /// Resolves and validates the domain of a new document.
    async fn resolve(
        &self,
        backend: &dyn BackendImpl,
        collection: &str,
        data: &Map<String, Value>,
    ) -> Result<OrderingDomain> {
        let group = self.group_of(collection, data)?;
        if let Some(group) = &group {
            self.validate_group(backend, collection, group).await?;
        }
        Ok(OrderingDomain {
            collection: collection.to_string(),
            group,
        })
    }

    /// Reads the domain of an existing document without validation.
    fn domain_of(&self, collection: &str, data: &Map<String, Value>) -> Result<OrderingDomain> {
        Ok(OrderingDomain {
            collection: collection.to_string(),
            group: self.group_of(collection, data)?,
        })
    }
}

/// The whole collection is a single domain.
#[derive(Debug, Clone, Copy, Default)]
pub struct Global;

#[async_trait]
impl GroupScope for Global {
    fn mode(&self) -> OrderingMode {
        OrderingMode::Unique
    }

    fn group_of(&self, _collection: &str, _data: &Map<String, Value>) -> Result<Option<GroupKey>> {
        Ok(None)
    }

    async fn validate_group(
        &self,
        _backend: &dyn BackendImpl,
        collection: &str,
        _group: &GroupKey,
    ) -> Result<()> {
        Err(ScopeError::NotGrouped {
            collection: collection.to_string(),
        }
        .into())
    }

    fn domain_filter(&self, domain: &OrderingDomain) -> Result<Filter> {
        match domain.group {
            None => Ok(Filter::All),
            Some(_) => Err(ScopeError::NotGrouped {
                collection: domain.collection.clone(),
            }
            .into()),
        }
    }

    fn group_patch(&self, collection: &str, _group: &GroupKey) -> Result<Patch> {
        Err(ScopeError::NotGrouped {
            collection: collection.to_string(),
        }
        .into())
    }
}

/// Records are grouped by the related record in `relation_field`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinScoped {
    /// Field holding the related record's id
    pub relation_field: String,
    /// Collection the related records live in
    pub related_collection: String,
}

impl JoinScoped {
    pub fn new(relation_field: impl Into<String>, related_collection: impl Into<String>) -> Self {
        Self {
            relation_field: relation_field.into(),
            related_collection: related_collection.into(),
        }
    }

    fn expect_relation<'a>(&self, collection: &str, group: &'a GroupKey) -> Result<&'a RecordId> {
        match group {
            GroupKey::Relation(id) => Ok(id),
            GroupKey::Bucket(_) => Err(ScopeError::WrongGroupKind {
                collection: collection.to_string(),
                expected: "relation",
            }
            .into()),
        }
    }
}

#[async_trait]
impl GroupScope for JoinScoped {
    fn mode(&self) -> OrderingMode {
        OrderingMode::Unique
    }

    fn group_of(&self, collection: &str, data: &Map<String, Value>) -> Result<Option<GroupKey>> {
        match data.get(&self.relation_field) {
            None | Some(Value::Null) => Err(ScopeError::MissingGroupValue {
                collection: collection.to_string(),
                field: self.relation_field.clone(),
            }
            .into()),
            Some(Value::String(id)) if !id.is_empty() => {
                Ok(Some(GroupKey::Relation(RecordId::new(id.as_str()))))
            }
            Some(other) => Err(ScopeError::InvalidGroupValue {
                collection: collection.to_string(),
                field: self.relation_field.clone(),
                reason: format!("expected a record id, found {other}"),
            }
            .into()),
        }
    }

    async fn validate_group(
        &self,
        backend: &dyn BackendImpl,
        collection: &str,
        group: &GroupKey,
    ) -> Result<()> {
        let id = self.expect_relation(collection, group)?;
        match backend.get(&self.related_collection, id).await {
            Ok(_) => Ok(()),
            Err(err) if err.is_not_found() => Err(ScopeError::RelatedRecordNotFound {
                collection: self.related_collection.clone(),
                id: id.clone(),
            }
            .into()),
            Err(err) => Err(err),
        }
    }

    fn domain_filter(&self, domain: &OrderingDomain) -> Result<Filter> {
        match &domain.group {
            Some(group) => {
                let id = self.expect_relation(&domain.collection, group)?;
                Ok(Filter::eq(&self.relation_field, id.as_str()))
            }
            None => Err(ScopeError::MissingGroupValue {
                collection: domain.collection.clone(),
                field: self.relation_field.clone(),
            }
            .into()),
        }
    }

    fn group_patch(&self, collection: &str, group: &GroupKey) -> Result<Patch> {
        let id = self.expect_relation(collection, group)?;
        let mut patch = Patch::new();
        patch.insert(self.relation_field.clone(), Value::from(id.as_str()));
        Ok(patch)
    }
}

/// Records carry an integer bucket in `bucket_field`; ties break on creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonUnique {
    pub bucket_field: String,
}

impl NonUnique {
    pub fn new(bucket_field: impl Into<String>) -> Self {
        Self {
            bucket_field: bucket_field.into(),
        }
    }
}

#[async_trait]
impl GroupScope for NonUnique {
    fn mode(&self) -> OrderingMode {
        OrderingMode::NonUnique
    }

    fn group_of(&self, collection: &str, data: &Map<String, Value>) -> Result<Option<GroupKey>> {
        match data.get(&self.bucket_field) {
            None | Some(Value::Null) => Err(ScopeError::MissingGroupValue {
                collection: collection.to_string(),
                field: self.bucket_field.clone(),
            }
            .into()),
            Some(value) => value
                .as_i64()
                .map(|n| Some(GroupKey::Bucket(n)))
                .ok_or_else(|| {
                    ScopeError::InvalidBucket {
                        collection: collection.to_string(),
                        field: self.bucket_field.clone(),
                        value: value.to_string(),
                    }
                    .into()
                }),
        }
    }

    async fn validate_group(
        &self,
        _backend: &dyn BackendImpl,
        collection: &str,
        group: &GroupKey,
    ) -> Result<()> {
        match group {
            GroupKey::Bucket(_) => Ok(()),
            GroupKey::Relation(_) => Err(ScopeError::WrongGroupKind {
                collection: collection.to_string(),
                expected: "bucket",
            }
            .into()),
        }
    }

    fn domain_filter(&self, domain: &OrderingDomain) -> Result<Filter> {
        match &domain.group {
            Some(GroupKey::Bucket(n)) => Ok(Filter::eq(&self.bucket_field, *n)),
            Some(GroupKey::Relation(_)) => Err(ScopeError::WrongGroupKind {
                collection: domain.collection.clone(),
                expected: "bucket",
            }
            .into()),
            None => Err(ScopeError::MissingGroupValue {
                collection: domain.collection.clone(),
                field: self.bucket_field.clone(),
            }
            .into()),
        }
    }

    fn group_patch(&self, collection: &str, group: &GroupKey) -> Result<Patch> {
        match group {
            GroupKey::Bucket(n) => {
                let mut patch = Patch::new();
                patch.insert(self.bucket_field.clone(), Value::from(*n));
                Ok(patch)
            }
            GroupKey::Relation(_) => Err(ScopeError::WrongGroupKind {
                collection: collection.to_string(),
                expected: "bucket",
            }
            .into()),
        }
    }
}

/// Serializable choice of scope for a collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScopeConfig {
    #[default]
    Global,
    Join {
        relation_field: String,
        related_collection: String,
    },
    NonUnique {
        bucket_field: String,
    },
}

impl ScopeConfig {
    /// Instantiates the scope.
    pub fn build(&self) -> Arc<dyn GroupScope> {
        match self {
            ScopeConfig::Global => Arc::new(Global),
            ScopeConfig::Join {
                relation_field,
                related_collection,
            } => Arc::new(JoinScoped::new(relation_field, related_collection)),
            ScopeConfig::NonUnique { bucket_field } => Arc::new(NonUnique::new(bucket_field)),
        }
    }
}
