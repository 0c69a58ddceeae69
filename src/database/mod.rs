//! Vault database layer.
//!
//! SQLite connection management, schema migrations and the opaque blob store.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use credvault::database::{BlobStore, Database};
//!
//! let db = Arc::new(Database::open("vault.db").expect("failed to open database"));
//! let store = BlobStore::new(db);
//! ```

pub mod blob_store;
pub mod connection;
pub mod migrations;

pub use blob_store::BlobStore;
pub use connection::Database;
