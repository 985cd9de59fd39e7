//! SQLite backend for the Finds venue store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. The upsert read-modify-write
//! cycle executes inside a single transaction: both sub-records commit or
//! neither does.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
