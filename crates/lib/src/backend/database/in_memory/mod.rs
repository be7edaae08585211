//! In-memory record store implementation
//!
//! This module provides an in-memory implementation of the `BackendImpl`
//! trait, suitable for testing, development, or embedding where persistence is
//! handled by snapshotting the whole store to a JSON file.

mod persistence;

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::Result;
use crate::backend::{BackendImpl, WriteOp, errors::BackendError};
use crate::record::{Filter, Record, RecordId};

/// Records of one collection, keyed by id.
pub(crate) type CollectionMap = BTreeMap<RecordId, Record>;

/// A simple in-memory record store.
///
/// Collections are held in a `HashMap` behind a single `RwLock`. Batches are
/// applied to staged copies of the touched collections and swapped in only
/// once every write has succeeded, so a failing batch leaves the store as it
/// was.
///
/// It provides basic persistence via `save_to_file` and `load_from_file`,
/// serializing every record to JSON.
#[derive(Debug, Default)]
pub struct InMemory {
    /// Collection slug -> records
    pub(crate) collections: RwLock<HashMap<String, CollectionMap>>,
}

impl InMemory {
    /// Creates a new, empty `InMemory` store.
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }

    /// Total number of records across all collections.
    pub async fn len(&self) -> usize {
        self.collections.read().await.values().map(BTreeMap::len).sum()
    }

    /// Returns true if the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Saves every record to a file as JSON.
    ///
    /// # Arguments
    /// * `path` - The path to the file where the state should be saved.
    ///
    /// # Returns
    /// A `Result` indicating success or an I/O or serialization error.
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        persistence::save_to_file(self, path).await
    }

    /// Loads a store from a JSON file written by [`save_to_file`](Self::save_to_file).
    ///
    /// If the file does not exist, a new, empty `InMemory` store is returned.
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        persistence::load_from_file(path).await
    }
}

/// Applies one write to the staged records of its collection.
fn apply_op(records: &mut CollectionMap, op: WriteOp) -> Result<()> {
    match op {
        WriteOp::Create(record) => {
            if records.contains_key(&record.id) {
                return Err(BackendError::RecordAlreadyExists {
                    collection: record.collection,
                    id: record.id,
                }
                .into());
            }
            records.insert(record.id.clone(), record);
        }
        WriteOp::Update {
            collection,
            id,
            patch,
        } => match records.get_mut(&id) {
            Some(record) => record.apply_patch(&patch),
            None => return Err(BackendError::RecordNotFound { collection, id }.into()),
        },
    }
    Ok(())
}

#[async_trait]
impl BackendImpl for InMemory {
    async fn get(&self, collection: &str, id: &RecordId) -> Result<Record> {
        let collections = self.collections.read().await;
        collections
            .get(collection)
            .and_then(|records| records.get(id))
            .cloned()
            .ok_or_else(|| {
                BackendError::RecordNotFound {
                    collection: collection.to_string(),
                    id: id.clone(),
                }
                .into()
            })
    }

    async fn query(&self, collection: &str, filter: &Filter) -> Result<Vec<Record>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|records| {
                records
                    .values()
                    .filter(|r| filter.matches(r))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn apply_batch(&self, ops: Vec<WriteOp>) -> Result<()> {
        let mut collections = self.collections.write().await;
        let mut staged: HashMap<String, CollectionMap> = HashMap::new();

        for op in ops {
            let records = staged
                .entry(op.collection().to_string())
                .or_insert_with(|| {
                    collections
                        .get(op.collection())
                        .cloned()
                        .unwrap_or_default()
                });
            apply_op(records, op)?;
        }

        collections.extend(staged);
        Ok(())
    }

    async fn delete(&self, collection: &str, filter: &Filter) -> Result<usize> {
        let mut collections = self.collections.write().await;
        let Some(records) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = records.len();
        records.retain(|_, r| !filter.matches(r));
        Ok(before - records.len())
    }

    async fn collections(&self) -> Result<Vec<String>> {
        let collections = self.collections.read().await;
        let mut names: Vec<String> = collections
            .iter()
            .filter(|(_, records)| !records.is_empty())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        Ok(names)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
