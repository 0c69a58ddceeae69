use std::fmt;

use uuid::Uuid;

use super::blob::EncryptedBlob;
use super::record::RecordKind;

/// A row of the opaque store: an identifier, the optional owning record and the blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub id: Uuid,
    pub owner: Option<Uuid>,
    pub blob: EncryptedBlob,
}

/// A stored row whose identifier, owner or blob does not parse. It can never be decrypted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnreadableRow {
    pub kind: RecordKind,
    /// The identifier exactly as stored.
    pub id: String,
    pub reason: String,
}

impl fmt::Display for UnreadableRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}: {}", self.kind.as_str(), self.id, self.reason)
    }
}

/// Rows of one listing, split by whether they parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub rows: Vec<StoredBlob>,
    pub unreadable: Vec<UnreadableRow>,
}

/// An encrypted account together with its encrypted details, as handed to the analysis engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAccount {
    pub id: Uuid,
    pub logo: Option<String>,
    pub blob: EncryptedBlob,
    pub details: Vec<StoredDetail>,
    /// Detail rows of this account that could not be read from the store.
    pub unreadable: Vec<UnreadableRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDetail {
    pub id: Uuid,
    pub blob: EncryptedBlob,
}

/// Everything an analysis run reads: the accounts, plus account rows that could not be read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredVault {
    pub accounts: Vec<StoredAccount>,
    pub unreadable: Vec<UnreadableRow>,
}

impl From<Vec<StoredAccount>> for StoredVault {
    fn from(accounts: Vec<StoredAccount>) -> Self {
        Self {
            accounts,
            unreadable: Vec::new(),
        }
    }
}
