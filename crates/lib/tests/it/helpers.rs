use std::{
    any::Any,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use serde_json::{Map, Value};

use orderable::{
    FixedClock, Result,
    backend::{BackendError, BackendImpl, WriteOp, database::InMemory},
    order::{CollectionConfig, OrderService},
    record::{Filter, Record, RecordId},
    scope::OrderingDomain,
};

/// Creates a test backend based on TEST_BACKEND env var.
///
/// Supported values:
/// - "inmemory" or unset: InMemory backend (default)
/// - "sqlite": SQLite in-memory backend (requires `sqlite` feature)
///
/// # Example
/// ```bash
/// # Run tests with InMemory (default)
/// cargo test
///
/// # Run tests with SQLite
/// TEST_BACKEND=sqlite cargo test --features sqlite
/// ```
pub async fn test_backend() -> Arc<dyn BackendImpl> {
    match std::env::var("TEST_BACKEND").as_deref() {
        Ok("sqlite") => {
            #[cfg(feature = "sqlite")]
            {
                use orderable::backend::database::Sqlite;
                Arc::new(
                    Sqlite::in_memory()
                        .await
                        .expect("Failed to create SQLite backend"),
                )
            }
            #[cfg(not(feature = "sqlite"))]
            {
                panic!("TEST_BACKEND=sqlite requires the 'sqlite' feature to be enabled")
            }
        }
        Ok("inmemory") | Err(_) => Arc::new(InMemory::new()),
        Ok(other) => panic!("Unknown TEST_BACKEND value: {other}"),
    }
}

/// Builds a JSON object from a `json!` literal.
pub fn doc(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// A service over `backend` with a deterministic clock.
pub fn service_on(backend: Arc<dyn BackendImpl>, config: CollectionConfig) -> OrderService {
    OrderService::with_clock(backend, config, Arc::new(FixedClock::default()))
        .expect("valid collection config")
}

/// A globally ordered `posts` service on the test backend.
pub async fn posts_service(key_length: usize) -> OrderService {
    let config = CollectionConfig::new("posts").with_key_length(key_length);
    service_on(test_backend().await, config)
}

/// Ids of a domain in display order.
pub async fn ids_in(service: &OrderService, domain: &OrderingDomain) -> Vec<RecordId> {
    service
        .list_ordered(domain)
        .await
        .expect("list domain")
        .map(|item| item.record.id)
        .collect()
}

/// Titles of a domain in display order.
pub async fn titles_in(service: &OrderService, domain: &OrderingDomain) -> Vec<String> {
    service
        .list_ordered(domain)
        .await
        .expect("list domain")
        .map(|item| item.record.str_field("title").unwrap_or_default().to_string())
        .collect()
}

/// Asserts that the stored keys of a domain are strictly increasing.
pub async fn assert_keys_increasing(service: &OrderService, domain: &OrderingDomain) {
    let keys: Vec<String> = service
        .list_ordered(domain)
        .await
        .expect("list domain")
        .map(|item| {
            item.value
                .key()
                .expect("every item keyed")
                .as_str()
                .to_string()
        })
        .collect();
    for pair in keys.windows(2) {
        assert!(pair[0] < pair[1], "keys out of order: {keys:?}");
    }
}

/// Wraps an [`InMemory`] store and rejects batches larger than a limit.
///
/// Used to make rebalancing writes fail while single-record writes succeed.
#[derive(Debug)]
pub struct FailingBackend {
    pub inner: InMemory,
    max_batch: AtomicUsize,
    pub rejected: AtomicUsize,
}

impl FailingBackend {
    pub fn new() -> Self {
        Self {
            inner: InMemory::new(),
            max_batch: AtomicUsize::new(usize::MAX),
            rejected: AtomicUsize::new(0),
        }
    }

    /// Rejects every later batch holding more than `ops` writes.
    pub fn reject_batches_over(&self, ops: usize) {
        self.max_batch.store(ops, Ordering::SeqCst);
    }
}

#[async_trait]
impl BackendImpl for FailingBackend {
    async fn get(&self, collection: &str, id: &RecordId) -> Result<Record> {
        self.inner.get(collection, id).await
    }

    async fn query(&self, collection: &str, filter: &Filter) -> Result<Vec<Record>> {
        self.inner.query(collection, filter).await
    }

    async fn apply_batch(&self, ops: Vec<WriteOp>) -> Result<()> {
        if ops.len() > self.max_batch.load(Ordering::SeqCst) {
            self.rejected.fetch_add(1, Ordering::SeqCst);
            return Err(BackendError::BatchRejected {
                ops: ops.len(),
                reason: "injected failure".to_string(),
            }
            .into());
        }
        self.inner.apply_batch(ops).await
    }

    async fn delete(&self, collection: &str, filter: &Filter) -> Result<usize> {
        self.inner.delete(collection, filter).await
    }

    async fn collections(&self) -> Result<Vec<String>> {
        self.inner.collections().await
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
