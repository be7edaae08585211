//! Record store backends.
//!
//! The ordering engine does not own record storage. It talks to a store
//! through the [`BackendImpl`] trait, which covers the handful of operations
//! the engine needs: point reads, filtered reads, single writes and an atomic
//! multi-record batch used by rebalancing.
//!
//! Implementations are organised by category under [`database`].

use std::any::Any;

use async_trait::async_trait;

use crate::{
    Result,
    record::{Filter, Patch, Record, RecordId},
};

pub mod database;
pub mod errors;

pub use errors::BackendError;

/// A single write inside a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Insert a new record. Fails if the id is already taken.
    Create(Record),
    /// Patch top-level fields of an existing record.
    Update {
        collection: String,
        id: RecordId,
        patch: Patch,
    },
}

impl WriteOp {
    /// Collection this write targets.
    pub fn collection(&self) -> &str {
        match self {
            WriteOp::Create(record) => &record.collection,
            WriteOp::Update { collection, .. } => collection,
        }
    }

    /// Id of the record this write targets.
    pub fn id(&self) -> &RecordId {
        match self {
            WriteOp::Create(record) => &record.id,
            WriteOp::Update { id, .. } => id,
        }
    }
}

/// Storage interface consumed by the ordering engine.
///
/// All implementations must be `Send` and `Sync` so a single store can back
/// many concurrent request handlers, and implement `Any` for downcasting
/// (used by the CLI to persist the in-memory store on exit).
///
/// ## Atomicity
///
/// [`apply_batch`](BackendImpl::apply_batch) must apply every write or none of
/// them. Single-record writes are expected to be atomic on their own.
#[async_trait]
pub trait BackendImpl: Send + Sync + Any {
    /// Retrieves a record by id.
    ///
    /// # Returns
    /// The record, or `BackendError::RecordNotFound`.
    async fn get(&self, collection: &str, id: &RecordId) -> Result<Record>;

    /// Retrieves every record of a collection matching the filter.
    ///
    /// Results come back in no particular order; ordering is the engine's job.
    async fn query(&self, collection: &str, filter: &Filter) -> Result<Vec<Record>>;

    /// Applies a list of writes atomically.
    async fn apply_batch(&self, ops: Vec<WriteOp>) -> Result<()>;

    /// Deletes every record of a collection matching the filter.
    ///
    /// # Returns
    /// The number of deleted records.
    async fn delete(&self, collection: &str, filter: &Filter) -> Result<usize>;

    /// Lists the collections that currently hold records.
    async fn collections(&self) -> Result<Vec<String>>;

    /// Inserts a single record.
    async fn create(&self, record: Record) -> Result<()> {
        self.apply_batch(vec![WriteOp::Create(record)]).await
    }

    /// Patches a single record.
    async fn update(&self, collection: &str, id: &RecordId, patch: Patch) -> Result<()> {
        self.apply_batch(vec![WriteOp::Update {
            collection: collection.to_string(),
            id: id.clone(),
            patch,
        }])
        .await
    }

    /// Returns a reference to the backend as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;
}
