use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kinds of records kept in the vault. Each kind has a fixed column schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    Account,
    Detail,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Account => "account",
            RecordKind::Detail => "detail",
        }
    }
}

/// An account groups the details (usernames, passwords, ...) of one service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub created: i64,
    pub changed: i64,
}

impl Account {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        let now = now_ts();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: description.into(),
            created: now,
            changed: now,
        }
    }
}

/// A single piece of information stored under an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detail {
    pub id: Uuid,
    /// Owning account. Not part of the encrypted columns; the store keeps it as the row owner.
    pub account: Uuid,
    pub name: String,
    pub content: String,
    pub created: i64,
    pub changed: i64,
    pub detail_type: DetailType,
    pub obfuscated: bool,
    pub visible: bool,
}

impl Detail {
    pub fn new(
        account: Uuid,
        name: impl Into<String>,
        content: impl Into<String>,
        detail_type: DetailType,
    ) -> Self {
        let now = now_ts();
        Self {
            id: Uuid::new_v4(),
            account,
            name: name.into(),
            content: content.into(),
            created: now,
            changed: now,
            detail_type,
            obfuscated: detail_type == DetailType::Password,
            visible: true,
        }
    }

    pub fn is_password(&self) -> bool {
        self.detail_type == DetailType::Password
    }
}

/// Type of a detail, persisted by a stable numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DetailType {
    Text,
    Number,
    SecurityQuestion,
    Address,
    Date,
    Email,
    Password,
    Url,
    Pin,
    Undefined,
}

impl DetailType {
    pub fn persistent_id(&self) -> i8 {
        match self {
            DetailType::Text => 0,
            DetailType::Number => 1,
            DetailType::SecurityQuestion => 2,
            DetailType::Address => 3,
            DetailType::Date => 4,
            DetailType::Email => 5,
            DetailType::Password => 6,
            DetailType::Url => 7,
            DetailType::Pin => 8,
            DetailType::Undefined => -1,
        }
    }

    /// Maps a stored code back to a type. Unknown codes become [`DetailType::Undefined`].
    pub fn from_persistent_id(id: i8) -> Self {
        match id {
            0 => DetailType::Text,
            1 => DetailType::Number,
            2 => DetailType::SecurityQuestion,
            3 => DetailType::Address,
            4 => DetailType::Date,
            5 => DetailType::Email,
            6 => DetailType::Password,
            7 => DetailType::Url,
            8 => DetailType::Pin,
            _ => DetailType::Undefined,
        }
    }
}

/// Current time in seconds since the Unix epoch.
pub fn now_ts() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
