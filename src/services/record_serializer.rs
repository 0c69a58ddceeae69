//! Conversion between structured records and encrypted blobs.
//!
//! A record is flattened into one codec row in a fixed column order for its kind, then sealed
//! by the [`RecordCipher`]. Decoding is positional. A column that cannot be parsed falls back to
//! its default and is reported as a [`SchemaError`]; it never fails the whole record.
//!
//! The column schemas carry no version marker. Adding or removing a column breaks every blob
//! written before the change.

use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::services::delimited_codec::{Field, RowBuilder, RowParser};
use crate::services::record_cipher::RecordCipher;
use crate::types::blob::EncryptedBlob;
use crate::types::errors::{CodecError, CryptoError, RecordError, SchemaError};
use crate::types::record::{now_ts, Account, Detail, DetailType, RecordKind};

/// Identity of a stored record: its own ID and, for details, the owning account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub id: Uuid,
    pub owner: Option<Uuid>,
}

impl RecordHeader {
    pub fn account(id: Uuid) -> Self {
        Self { id, owner: None }
    }

    pub fn detail(id: Uuid, account: Uuid) -> Self {
        Self {
            id,
            owner: Some(account),
        }
    }

    /// Seed conventionally used for this record: the owner's ID if any, else its own.
    pub fn seed(&self) -> Vec<u8> {
        seed_for(self.owner.unwrap_or(self.id))
    }
}

/// Seed bytes for an identifier: its hyphenated lowercase string form.
pub fn seed_for(id: Uuid) -> Vec<u8> {
    id.hyphenated().to_string().into_bytes()
}

/// A record kind with a fixed column schema.
pub trait Record: Sized {
    const KIND: RecordKind;

    /// Number of columns written by [`Record::to_fields`].
    const COLUMNS: usize;

    fn header(&self) -> RecordHeader;

    fn to_fields(&self) -> Vec<Field>;

    /// Rebuilds the record from decoded columns, substituting defaults for bad columns.
    fn from_fields(header: RecordHeader, columns: Columns) -> (Self, Vec<SchemaError>);
}

/// Decoded columns with typed, defaulting accessors.
pub struct Columns {
    kind: RecordKind,
    values: Vec<Option<String>>,
    errors: Vec<SchemaError>,
}

impl Columns {
    pub fn new(kind: RecordKind, values: Vec<Option<String>>) -> Self {
        Self {
            kind,
            values,
            errors: Vec::new(),
        }
    }

    fn raw(&mut self, index: usize) -> Option<&str> {
        if index >= self.values.len() {
            self.errors
                .push(SchemaError::new(self.kind.as_str(), index, "missing column"));
            return None;
        }
        self.values[index].as_deref()
    }

    /// String column; null or missing becomes empty.
    pub fn text(&mut self, index: usize) -> String {
        self.raw(index).unwrap_or_default().to_string()
    }

    /// Timestamp column; anything but an integer becomes the current time.
    pub fn timestamp(&mut self, index: usize) -> i64 {
        self.parsed(index, "timestamp", now_ts)
    }

    pub fn flag(&mut self, index: usize, default: bool) -> bool {
        self.parsed(index, "boolean", || default)
    }

    pub fn detail_type(&mut self, index: usize) -> DetailType {
        let code: i8 = self.parsed(index, "detail type", || DetailType::Text.persistent_id());
        DetailType::from_persistent_id(code)
    }

    fn parsed<T, F>(&mut self, index: usize, what: &str, default: F) -> T
    where
        T: std::str::FromStr,
        F: FnOnce() -> T,
    {
        let kind = self.kind.as_str();
        match self.raw(index).map(str::parse::<T>) {
            Some(Ok(value)) => value,
            Some(Err(_)) => {
                self.errors
                    .push(SchemaError::new(kind, index, format!("invalid {}", what)));
                default()
            }
            None => default(),
        }
    }

    fn finish(mut self, expected: usize) -> Vec<SchemaError> {
        if self.values.len() > expected {
            self.errors.push(SchemaError::new(
                self.kind.as_str(),
                expected,
                format!("{} unexpected extra columns", self.values.len() - expected),
            ));
        }
        self.errors
    }
}

/// A record decoded from a blob, with the columns that had to fall back to defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<R> {
    pub record: R,
    pub fallbacks: Vec<SchemaError>,
}

impl<R> Decoded<R> {
    pub fn is_clean(&self) -> bool {
        self.fallbacks.is_empty()
    }

    pub fn into_record(self) -> R {
        self.record
    }
}

impl Record for Account {
    const KIND: RecordKind = RecordKind::Account;
    const COLUMNS: usize = 4;

    fn header(&self) -> RecordHeader {
        RecordHeader::account(self.id)
    }

    fn to_fields(&self) -> Vec<Field> {
        vec![
            self.name.as_str().into(),
            self.description.as_str().into(),
            self.created.into(),
            self.changed.into(),
        ]
    }

    fn from_fields(header: RecordHeader, mut columns: Columns) -> (Self, Vec<SchemaError>) {
        let account = Account {
            id: header.id,
            name: columns.text(0),
            description: columns.text(1),
            created: columns.timestamp(2),
            changed: columns.timestamp(3),
        };
        (account, columns.finish(Self::COLUMNS))
    }
}

impl Record for Detail {
    const KIND: RecordKind = RecordKind::Detail;
    const COLUMNS: usize = 7;

    fn header(&self) -> RecordHeader {
        RecordHeader::detail(self.id, self.account)
    }

    fn to_fields(&self) -> Vec<Field> {
        vec![
            self.name.as_str().into(),
            self.content.as_str().into(),
            self.created.into(),
            self.changed.into(),
            self.detail_type.persistent_id().into(),
            self.obfuscated.into(),
            self.visible.into(),
        ]
    }

    fn from_fields(header: RecordHeader, mut columns: Columns) -> (Self, Vec<SchemaError>) {
        let detail = Detail {
            id: header.id,
            account: header.owner.unwrap_or(header.id),
            name: columns.text(0),
            content: columns.text(1),
            created: columns.timestamp(2),
            changed: columns.timestamp(3),
            detail_type: columns.detail_type(4),
            obfuscated: columns.flag(5, false),
            visible: columns.flag(6, true),
        };
        (detail, columns.finish(Self::COLUMNS))
    }
}

/// Turns records into encrypted blobs and back.
pub struct RecordSerializer {
    cipher: Arc<RecordCipher>,
}

impl RecordSerializer {
    pub fn new(cipher: Arc<RecordCipher>) -> Self {
        Self { cipher }
    }

    pub fn cipher(&self) -> &Arc<RecordCipher> {
        &self.cipher
    }

    /// Encodes the record's columns and encrypts them with the key derived from `seed`.
    pub fn to_blob<R: Record>(
        &self,
        record: &R,
        seed: &[u8],
    ) -> Result<EncryptedBlob, CryptoError> {
        let mut builder = RowBuilder::new();
        for field in record.to_fields() {
            builder.append(field);
        }
        builder.new_line();
        let row = zeroize::Zeroizing::new(builder.finish());
        self.cipher.encrypt(row.as_bytes(), seed)
    }

    /// Decrypts the blob with `seed` and decodes it positionally as an `R`.
    pub fn from_blob<R: Record>(
        &self,
        blob: &EncryptedBlob,
        seed: &[u8],
        header: RecordHeader,
    ) -> Result<Decoded<R>, RecordError> {
        let plaintext = zeroize::Zeroizing::new(self.cipher.decrypt(blob, seed)?);
        let text = std::str::from_utf8(&plaintext)
            .map_err(|e| RecordError::Decode(CodecError::InvalidUtf8(e.to_string())))?;

        let mut parser = RowParser::new(text);
        let values = parser.next_row();
        for err in parser.errors() {
            warn!(
                kind = R::KIND.as_str(),
                id = %header.id,
                error = %err,
                "recovered malformed record text"
            );
        }

        let (record, fallbacks) = R::from_fields(header, Columns::new(R::KIND, values));
        for fallback in &fallbacks {
            warn!(id = %header.id, error = %fallback, "column replaced by default");
        }
        if fallbacks.is_empty() {
            debug!(kind = R::KIND.as_str(), id = %header.id, "record decoded");
        }
        Ok(Decoded { record, fallbacks })
    }

    /// Encrypts the record with its conventional seed (see [`RecordHeader::seed`]).
    pub fn seal<R: Record>(&self, record: &R) -> Result<EncryptedBlob, CryptoError> {
        self.to_blob(record, &record.header().seed())
    }

    /// Decrypts a blob written by [`RecordSerializer::seal`].
    pub fn open<R: Record>(
        &self,
        blob: &EncryptedBlob,
        header: RecordHeader,
    ) -> Result<Decoded<R>, RecordError> {
        self.from_blob(blob, &header.seed(), header)
    }
}
