//! `pitwall-store`: durable home of custom races, championships, and race
//! weekends.
//!
//! Every aggregate is one JSON document in its own SQLite table. Scheduling
//! state (the `scheduled` and `recurrence` fields) travels inside the
//! document, so the store is the system of record and in-memory timers are
//! rebuilt from it on every start.

pub mod db;
pub mod error;
pub mod sqlite;
pub mod store;

pub use error::{Result, StoreError};
pub use sqlite::SqliteStore;
pub use store::Store;
