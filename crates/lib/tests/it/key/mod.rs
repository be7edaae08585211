//! Order key integration tests
//!
//! Properties of key allocation that only show up over many operations:
//! precision exhaustion, the rebalance it triggers, and string ordering of
//! the keys as stored.

mod allocation;
