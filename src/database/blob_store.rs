//! Opaque blob store.
//!
//! Keeps one encrypted blob per record, keyed by record kind and ID. The store never sees
//! plaintext; ownership of details is the only relation it knows about.

use std::sync::Arc;

use rusqlite::{params, OptionalExtension};
use tracing::{debug, warn};
use uuid::Uuid;

use super::Database;
use crate::types::blob::EncryptedBlob;
use crate::types::errors::StoreError;
use crate::types::record::{now_ts, RecordKind};
use crate::types::store::{Listing, StoredBlob, UnreadableRow};

/// Raw row as read from SQLite, before ID and blob validation.
type RawRow = (String, Option<String>, Vec<u8>);

fn table(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::Account => "accounts",
        RecordKind::Detail => "details",
    }
}

fn select_columns(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::Account => "SELECT id, NULL, content FROM accounts",
        RecordKind::Detail => "SELECT id, account, content FROM details",
    }
}

fn parse_row(id: &str, owner: Option<&str>, content: &[u8]) -> Result<StoredBlob, String> {
    let id = Uuid::parse_str(id).map_err(|e| format!("bad id: {}", e))?;
    let owner = owner
        .map(Uuid::parse_str)
        .transpose()
        .map_err(|e| format!("bad owner: {}", e))?;
    let blob = EncryptedBlob::from_bytes(content).map_err(|e| e.to_string())?;
    Ok(StoredBlob { id, owner, blob })
}

fn row_to_blob(
    kind: RecordKind,
    (id, owner, content): RawRow,
) -> Result<StoredBlob, UnreadableRow> {
    parse_row(&id, owner.as_deref(), &content)
        .map_err(|reason| UnreadableRow { kind, id, reason })
}

fn read_row(row: &rusqlite::Row) -> rusqlite::Result<RawRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
}

pub struct BlobStore {
    db: Arc<Database>,
}

impl BlobStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Inserts a new record. Details must carry the ID of an existing account as owner.
    pub fn insert(&self, kind: RecordKind, row: &StoredBlob) -> Result<(), StoreError> {
        let conn = self.db.connection();
        let content = row.blob.to_bytes();
        match kind {
            RecordKind::Account => conn.execute(
                "INSERT INTO accounts (id, content, updated_at) VALUES (?1, ?2, ?3)",
                params![row.id.to_string(), content, now_ts()],
            )?,
            RecordKind::Detail => {
                let owner = row.owner.ok_or_else(|| {
                    StoreError::DatabaseError(format!("detail {} has no owning account", row.id))
                })?;
                conn.execute(
                    "INSERT INTO details (id, account, content, updated_at) VALUES (?1, ?2, ?3, ?4)",
                    params![row.id.to_string(), owner.to_string(), content, now_ts()],
                )?
            }
        };
        debug!(kind = kind.as_str(), id = %row.id, "blob inserted");
        Ok(())
    }

    /// Replaces the blob of an existing record.
    pub fn update(
        &self,
        kind: RecordKind,
        id: Uuid,
        blob: &EncryptedBlob,
    ) -> Result<(), StoreError> {
        let sql = format!(
            "UPDATE {} SET content = ?1, updated_at = ?2 WHERE id = ?3",
            table(kind)
        );
        let changed = self
            .db
            .connection()
            .execute(&sql, params![blob.to_bytes(), now_ts(), id.to_string()])?;
        if changed == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        debug!(kind = kind.as_str(), %id, "blob updated");
        Ok(())
    }

    /// Deletes a record. Deleting an account also deletes its details.
    pub fn delete(&self, kind: RecordKind, id: Uuid) -> Result<(), StoreError> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", table(kind));
        let changed = self.db.connection().execute(&sql, params![id.to_string()])?;
        if changed == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        debug!(kind = kind.as_str(), %id, "blob deleted");
        Ok(())
    }

    pub fn select(&self, kind: RecordKind, id: Uuid) -> Result<StoredBlob, StoreError> {
        let sql = format!("{} WHERE id = ?1", select_columns(kind));
        let raw = self
            .db
            .connection()
            .query_row(&sql, params![id.to_string()], read_row)
            .optional()?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        row_to_blob(kind, raw).map_err(|row| StoreError::Corrupt(row.to_string()))
    }

    /// All readable records of a kind, in insertion order. Unreadable rows are skipped.
    pub fn select_all(&self, kind: RecordKind) -> Result<Vec<StoredBlob>, StoreError> {
        Ok(skip_unreadable(self.list_all(kind)?))
    }

    /// Readable details owned by `account`, in insertion order.
    pub fn select_owned_by(&self, account: Uuid) -> Result<Vec<StoredBlob>, StoreError> {
        Ok(skip_unreadable(self.list_owned_by(account)?))
    }

    /// All records of a kind, in insertion order, with rows that do not parse kept apart.
    pub fn list_all(&self, kind: RecordKind) -> Result<Listing, StoreError> {
        let sql = format!("{} ORDER BY rowid", select_columns(kind));
        self.collect(kind, &sql, &[])
    }

    /// Details owned by `account`, in insertion order, with rows that do not parse kept apart.
    pub fn list_owned_by(&self, account: Uuid) -> Result<Listing, StoreError> {
        let sql = format!(
            "{} WHERE account = ?1 ORDER BY rowid",
            select_columns(RecordKind::Detail)
        );
        self.collect(RecordKind::Detail, &sql, &[&account.to_string()])
    }

    pub fn contains(&self, kind: RecordKind, id: Uuid) -> Result<bool, StoreError> {
        let sql = format!("SELECT 1 FROM {} WHERE id = ?1", table(kind));
        let found = self
            .db
            .connection()
            .query_row(&sql, params![id.to_string()], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }

    /// Sets or clears the clear-text logo reference of an account.
    pub fn set_logo(&self, account: Uuid, logo: Option<&str>) -> Result<(), StoreError> {
        let changed = self.db.connection().execute(
            "UPDATE accounts SET logo = ?1 WHERE id = ?2",
            params![logo, account.to_string()],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(account.to_string()));
        }
        Ok(())
    }

    pub fn logo(&self, account: Uuid) -> Result<Option<String>, StoreError> {
        self.db
            .connection()
            .query_row(
                "SELECT logo FROM accounts WHERE id = ?1",
                params![account.to_string()],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(account.to_string()))
    }

    fn collect(
        &self,
        kind: RecordKind,
        sql: &str,
        args: &[&dyn rusqlite::ToSql],
    ) -> Result<Listing, StoreError> {
        let raw: Vec<RawRow> = {
            let conn = self.db.connection();
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt.query_map(args, read_row)?;
            rows.collect::<Result<_, _>>()?
        };
        let mut listing = Listing::default();
        for row in raw {
            match row_to_blob(kind, row) {
                Ok(blob) => listing.rows.push(blob),
                Err(row) => listing.unreadable.push(row),
            }
        }
        Ok(listing)
    }
}

fn skip_unreadable(listing: Listing) -> Vec<StoredBlob> {
    for row in &listing.unreadable {
        warn!(row = %row, "unreadable row skipped");
    }
    listing.rows
}
