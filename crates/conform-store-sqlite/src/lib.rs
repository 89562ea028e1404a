//! SQLite backend for the Conform assessment store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! pool without blocking the async runtime. Every mutating operation runs its
//! full read-modify-write inside one transaction on the connection's single
//! worker thread, making each round trip atomic per assessment.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
