//! Schema migrations for the vault database.
//!
//! A `schema_version` table records which migrations have been applied.
//! Each migration runs exactly once.

use rusqlite::Connection;

use crate::types::record::now_ts;

/// Current schema version. Bump this when adding a new migration.
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Returns the highest applied migration (0 for a fresh database).
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .unwrap_or(0)
}

/// Runs all pending migrations. Safe to call on every open.
///
/// # Errors
/// Returns `rusqlite::Error` if any SQL statement fails.
pub fn run_all(conn: &Connection) -> Result<(), rusqlite::Error> {
    // Per-connection pragmas, not versioned.
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA foreign_keys = ON;
         CREATE TABLE IF NOT EXISTS schema_version (
             version INTEGER PRIMARY KEY,
             applied_at INTEGER NOT NULL,
             description TEXT NOT NULL
         );",
    )?;

    let current = get_schema_version(conn);

    if current < 1 {
        migration_v1(conn)?;
        record_version(conn, 1, "Encrypted accounts and details")?;
    }

    if current < 2 {
        migration_v2(conn)?;
        record_version(conn, 2, "Account logos, detail owner index")?;
    }

    Ok(())
}

fn record_version(
    conn: &Connection,
    version: i32,
    description: &str,
) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version, applied_at, description) VALUES (?1, ?2, ?3)",
        rusqlite::params![version, now_ts(), description],
    )?;
    Ok(())
}

/// V1: one table per record kind. `content` holds the encrypted blob (nonce followed by sealed
/// bytes).
fn migration_v1(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS accounts (
            id TEXT PRIMARY KEY,
            content BLOB NOT NULL,
            updated_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS details (
            id TEXT PRIMARY KEY,
            account TEXT NOT NULL,
            content BLOB NOT NULL,
            updated_at INTEGER NOT NULL,
            FOREIGN KEY (account) REFERENCES accounts(id) ON DELETE CASCADE
        );
        ",
    )
}

/// V2: logo reference kept in clear next to the account blob.
fn migration_v2(conn: &Connection) -> Result<(), rusqlite::Error> {
    if conn.prepare("SELECT logo FROM accounts LIMIT 0").is_err() {
        conn.execute_batch("ALTER TABLE accounts ADD COLUMN logo TEXT;")?;
    }
    conn.execute_batch("CREATE INDEX IF NOT EXISTS idx_details_account ON details(account);")
}
