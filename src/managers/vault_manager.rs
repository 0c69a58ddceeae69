//! Vault Manager.
//!
//! The calling layer between structured records and the opaque store: every save seals the
//! record with [`RecordSerializer`], every load opens it again. Also feeds the password
//! analysis engine through [`CredentialSource`].

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::database::{BlobStore, Database};
use crate::services::password_analysis::CredentialSource;
use crate::services::record_serializer::{Record, RecordHeader, RecordSerializer};
use crate::types::errors::StoreError;
use crate::types::record::{Account, Detail, RecordKind};
use crate::types::store::{StoredAccount, StoredBlob, StoredDetail, StoredVault};

pub struct VaultManager {
    store: BlobStore,
    serializer: Arc<RecordSerializer>,
}

impl VaultManager {
    pub fn new(db: Arc<Database>, serializer: Arc<RecordSerializer>) -> Self {
        Self {
            store: BlobStore::new(db),
            serializer,
        }
    }

    /// Inserts or replaces an account.
    pub fn save_account(&self, account: &Account) -> Result<(), StoreError> {
        self.save(account)
    }

    pub fn load_account(&self, id: Uuid) -> Result<Account, StoreError> {
        let stored = self.store.select(RecordKind::Account, id)?;
        Ok(self
            .serializer
            .open::<Account>(&stored.blob, RecordHeader::account(id))?
            .into_record())
    }

    /// Every readable account. Accounts that fail to decrypt are skipped.
    pub fn list_accounts(&self) -> Result<Vec<Account>, StoreError> {
        let rows = self.store.select_all(RecordKind::Account)?;
        Ok(self.open_all(rows, |row| RecordHeader::account(row.id)))
    }

    /// Deletes an account and all of its details.
    pub fn delete_account(&self, id: Uuid) -> Result<(), StoreError> {
        self.store.delete(RecordKind::Account, id)?;
        info!(account = %id, "account deleted");
        Ok(())
    }

    /// Inserts or replaces a detail. Its owning account must already be stored.
    pub fn save_detail(&self, detail: &Detail) -> Result<(), StoreError> {
        if !self.store.contains(RecordKind::Account, detail.account)? {
            return Err(StoreError::NotFound(detail.account.to_string()));
        }
        self.save(detail)
    }

    pub fn load_detail(&self, id: Uuid) -> Result<Detail, StoreError> {
        let stored = self.store.select(RecordKind::Detail, id)?;
        let owner = stored
            .owner
            .ok_or_else(|| StoreError::Corrupt(format!("detail {} has no owner", id)))?;
        Ok(self
            .serializer
            .open::<Detail>(&stored.blob, RecordHeader::detail(id, owner))?
            .into_record())
    }

    /// Readable details of an account, in insertion order.
    pub fn details_of(&self, account: Uuid) -> Result<Vec<Detail>, StoreError> {
        let rows = self.store.select_owned_by(account)?;
        Ok(self.open_all(rows, |row| RecordHeader::detail(row.id, account)))
    }

    pub fn delete_detail(&self, id: Uuid) -> Result<(), StoreError> {
        self.store.delete(RecordKind::Detail, id)
    }

    pub fn set_logo(&self, account: Uuid, logo: Option<&str>) -> Result<(), StoreError> {
        self.store.set_logo(account, logo)
    }

    pub fn logo(&self, account: Uuid) -> Result<Option<String>, StoreError> {
        self.store.logo(account)
    }

    fn save<R: Record>(&self, record: &R) -> Result<(), StoreError> {
        let header = record.header();
        let blob = self.serializer.seal(record)?;
        match self.store.update(R::KIND, header.id, &blob) {
            Err(StoreError::NotFound(_)) => self.store.insert(
                R::KIND,
                &StoredBlob {
                    id: header.id,
                    owner: header.owner,
                    blob,
                },
            ),
            other => other,
        }
    }

    fn open_all<R, F>(&self, rows: Vec<StoredBlob>, header: F) -> Vec<R>
    where
        R: Record,
        F: Fn(&StoredBlob) -> RecordHeader,
    {
        rows.iter()
            .filter_map(|row| match self.serializer.open::<R>(&row.blob, header(row)) {
                Ok(decoded) => Some(decoded.into_record()),
                Err(err) => {
                    warn!(
                        kind = R::KIND.as_str(),
                        id = %row.id,
                        error = %err,
                        "unreadable record skipped"
                    );
                    None
                }
            })
            .collect()
    }
}

impl CredentialSource for VaultManager {
    /// Lists every account with its details, still encrypted. Rows that do not parse are
    /// passed on as unreadable.
    fn load_entries(&self) -> Result<StoredVault, StoreError> {
        let listing = self.store.list_all(RecordKind::Account)?;
        let accounts = listing
            .rows
            .into_iter()
            .map(|account| -> Result<StoredAccount, StoreError> {
                let details = self.store.list_owned_by(account.id)?;
                Ok(StoredAccount {
                    id: account.id,
                    logo: self.store.logo(account.id)?,
                    blob: account.blob,
                    details: details
                        .rows
                        .into_iter()
                        .map(|row| StoredDetail {
                            id: row.id,
                            blob: row.blob,
                        })
                        .collect(),
                    unreadable: details.unreadable,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(StoredVault {
            accounts,
            unreadable: listing.unreadable,
        })
    }
}
