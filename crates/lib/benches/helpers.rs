//! Shared helpers for benchmark tests

use std::sync::Arc;

use orderable::{
    FixedClock, OrderService, Placement, RecordId,
    backend::{BackendImpl, database::InMemory},
    order::CollectionConfig,
};

/// Creates a test backend based on TEST_BACKEND env var.
///
/// Supported values:
/// - "inmemory" or unset: InMemory backend (default)
/// - "sqlite": SQLite in-memory backend (requires `sqlite` feature)
///
/// This mirrors the pattern used in integration tests for consistency.
async fn test_backend() -> Arc<dyn BackendImpl> {
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
        Ok("inmemory") | Ok("") | Err(_) => Arc::new(InMemory::new()),
        Ok(other) => {
            panic!("Unknown TEST_BACKEND value: {other}. Supported: inmemory, sqlite")
        }
    }
}

/// Creates a globally ordered service with `items` records appended in order.
///
/// Returns the service and the ids in display order.
pub async fn setup_service(items: usize, key_length: usize) -> (OrderService, Vec<RecordId>) {
    let config = CollectionConfig::new("bench").with_key_length(key_length);
    let service = OrderService::with_clock(test_backend().await, config, Arc::new(FixedClock::default()))
        .expect("Failed to create service");

    let mut ids = Vec::with_capacity(items);
    for _ in 0..items {
        let committed = service
            .insert(Default::default(), Placement::End)
            .await
            .expect("Failed to insert");
        ids.push(committed.id);
    }
    (service, ids)
}
