//! Backend integration tests
//!
//! These run against the backend selected by TEST_BACKEND, except for the
//! persistence tests which are specific to the in-memory store.

mod record_operations;
mod save_load;
