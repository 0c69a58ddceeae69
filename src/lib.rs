//! credvault: a local credential vault.
//!
//! Records (accounts and their details) are flattened into delimited rows, sealed with a key
//! derived per record from a master key, and kept as opaque blobs in SQLite. The password
//! analysis engine decrypts the vault in the background and reports weak and reused passwords
//! against a configurable set of quality gates.

pub mod database;
pub mod managers;
pub mod platform;
pub mod services;
pub mod types;
