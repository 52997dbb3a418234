//! internaltx-storage — persistent backends for the internal-transaction
//! versioned store.
//!
//! Backends:
//! - [`sqlite`] — SQLite via `sqlx` (embedded, single-file persistence)
//!
//! The in-memory store lives in `internaltx_core::store::MemoryVersionedStore`.

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteVersionedStore;
