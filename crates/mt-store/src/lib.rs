//! Money tracker storage backends
//!
//! Implementations of the `mt_core` repository traits:
//! - `SqliteStore`: production store, invariants enforced by SQLite constraints
//! - `InMemoryStore`: lock-guarded maps with the same semantics, for tests

pub mod memory;
pub mod sqlite;

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;
