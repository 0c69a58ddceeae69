//! Unit tests for the vault database layer (connection, migrations, blob store).

use std::sync::Arc;

use credvault::database::migrations::{get_schema_version, run_all, CURRENT_SCHEMA_VERSION};
use credvault::database::{BlobStore, Database};
use credvault::types::blob::EncryptedBlob;
use credvault::types::errors::StoreError;
use credvault::types::record::RecordKind;
use credvault::types::store::StoredBlob;
use uuid::Uuid;

fn blob(fill: u8) -> EncryptedBlob {
    EncryptedBlob::from_bytes(&[fill; 32]).unwrap()
}

fn account_row(id: Uuid, fill: u8) -> StoredBlob {
    StoredBlob { id, owner: None, blob: blob(fill) }
}

#[test]
fn test_migrations_create_tables() {
    let db = Database::open_in_memory().expect("open_in_memory failed");
    let conn = db.connection();

    for table in ["accounts", "details", "schema_version"] {
        let exists: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name=?1",
                [table],
                |row| row.get(0),
            )
            .unwrap_or(false);
        assert!(exists, "Table '{}' should exist after migrations", table);
    }
}

#[test]
fn test_migrations_are_idempotent() {
    let db = Database::open_in_memory().expect("open_in_memory failed");
    let conn = db.connection();
    run_all(&conn).expect("second migration run should succeed");
    assert_eq!(get_schema_version(&conn), CURRENT_SCHEMA_VERSION);
}

#[test]
fn test_file_database_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vault.db");
    let id = Uuid::new_v4();

    {
        let store = BlobStore::new(Arc::new(Database::open(&path).unwrap()));
        store.insert(RecordKind::Account, &account_row(id, 3)).unwrap();
    }

    let store = BlobStore::new(Arc::new(Database::open(&path).unwrap()));
    assert_eq!(store.select(RecordKind::Account, id).unwrap().blob, blob(3));
}

#[test]
fn test_select_all_keeps_insertion_order() {
    let store = BlobStore::new(Arc::new(Database::open_in_memory().unwrap()));
    let ids: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
    for (i, id) in ids.iter().enumerate() {
        store.insert(RecordKind::Account, &account_row(*id, i as u8)).unwrap();
    }

    let listed: Vec<Uuid> = store
        .select_all(RecordKind::Account)
        .unwrap()
        .into_iter()
        .map(|row| row.id)
        .collect();
    assert_eq!(listed, ids);
}

#[test]
fn test_details_are_scoped_to_owner() {
    let store = BlobStore::new(Arc::new(Database::open_in_memory().unwrap()));
    let (first, second) = (Uuid::new_v4(), Uuid::new_v4());
    store.insert(RecordKind::Account, &account_row(first, 1)).unwrap();
    store.insert(RecordKind::Account, &account_row(second, 2)).unwrap();

    let detail = Uuid::new_v4();
    store
        .insert(
            RecordKind::Detail,
            &StoredBlob { id: detail, owner: Some(first), blob: blob(9) },
        )
        .unwrap();

    let owned = store.select_owned_by(first).unwrap();
    assert_eq!(owned.len(), 1);
    assert_eq!(owned[0].owner, Some(first));
    assert!(store.select_owned_by(second).unwrap().is_empty());
}

#[test]
fn test_detail_without_owner_rejected() {
    let store = BlobStore::new(Arc::new(Database::open_in_memory().unwrap()));
    let result = store.insert(RecordKind::Detail, &account_row(Uuid::new_v4(), 1));
    assert!(matches!(result, Err(StoreError::DatabaseError(_))));
}

#[test]
fn test_truncated_blob_row_is_skipped() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let store = BlobStore::new(Arc::clone(&db));
    let good = Uuid::new_v4();
    store.insert(RecordKind::Account, &account_row(good, 1)).unwrap();
    db.connection()
        .execute(
            "INSERT INTO accounts (id, content, updated_at) VALUES (?1, ?2, 0)",
            rusqlite::params![Uuid::new_v4().to_string(), vec![0u8; 5]],
        )
        .unwrap();

    let listed = store.select_all(RecordKind::Account).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, good);
}

#[test]
fn test_logo_roundtrip() {
    let store = BlobStore::new(Arc::new(Database::open_in_memory().unwrap()));
    let id = Uuid::new_v4();
    store.insert(RecordKind::Account, &account_row(id, 1)).unwrap();

    assert_eq!(store.logo(id).unwrap(), None);
    store.set_logo(id, Some("logos/mail.png")).unwrap();
    assert_eq!(store.logo(id).unwrap().as_deref(), Some("logos/mail.png"));
    assert!(matches!(
        store.set_logo(Uuid::new_v4(), None),
        Err(StoreError::NotFound(_))
    ));
}
