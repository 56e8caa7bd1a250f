//! Integration test support
//!
//! In-memory implementations of the storage ports plus helpers for wiring
//! them into a [`ServiceContext`](engage_service::ServiceContext). The
//! fakes honor the same atomicity contracts as the PostgreSQL and Redis
//! adapters, so service behavior can be exercised without either running.


pub use fixtures::*;
pub use helpers::*;
