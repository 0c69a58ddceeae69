use std::fmt;

// === CodecError ===

/// Errors raised while decoding delimited text.
///
/// The row parser itself never fails; it recovers with a best-effort final field and
/// reports what it recovered from through these values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A quoted field was opened at the given character offset but never closed.
    UnterminatedField(usize),
    /// The decrypted bytes were not valid UTF-8.
    InvalidUtf8(String),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::UnterminatedField(offset) => {
                write!(f, "Unterminated quoted field at offset {}", offset)
            }
            CodecError::InvalidUtf8(msg) => write!(f, "Invalid UTF-8 in record: {}", msg),
        }
    }
}

impl std::error::Error for CodecError {}

// === CryptoError ===

/// Errors related to cryptographic operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// The authentication tag did not verify: tampered data, wrong seed or wrong master key.
    Authentication,
    /// The external key store could not produce a signature.
    KeyProvider(String),
    /// Encryption operation failed.
    Encryption(String),
    /// Failed to generate random bytes.
    RandomGeneration(String),
    /// The blob is too short to hold a nonce and a tag.
    MalformedBlob(usize),
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CryptoError::Authentication => {
                write!(f, "Authentication failed: invalid seed, key or corrupted data")
            }
            CryptoError::KeyProvider(msg) => write!(f, "Key provider unavailable: {}", msg),
            CryptoError::Encryption(msg) => write!(f, "Encryption failed: {}", msg),
            CryptoError::RandomGeneration(msg) => {
                write!(f, "Random generation failed: {}", msg)
            }
            CryptoError::MalformedBlob(len) => {
                write!(f, "Malformed encrypted blob: {} bytes is too short", len)
            }
        }
    }
}

impl std::error::Error for CryptoError {}

// === SchemaError ===

/// A single column that could not be parsed for its record kind and was replaced by a default.
///
/// Schema errors never fail a record; they are reported next to the decoded value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError {
    pub kind: &'static str,
    pub column: usize,
    pub reason: String,
}

impl SchemaError {
    pub fn new(kind: &'static str, column: usize, reason: impl Into<String>) -> Self {
        Self {
            kind,
            column,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Schema error in {} column {}: {}",
            self.kind, self.column, self.reason
        )
    }
}

impl std::error::Error for SchemaError {}

// === RecordError ===

/// Errors from turning an encrypted blob back into a structured record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// Decryption failed.
    Crypto(CryptoError),
    /// The decrypted bytes could not be decoded.
    Decode(CodecError),
}

impl RecordError {
    /// Returns true if the failure came from the key store rather than from the data.
    pub fn is_key_provider(&self) -> bool {
        matches!(self, RecordError::Crypto(CryptoError::KeyProvider(_)))
    }
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordError::Crypto(err) => write!(f, "Record crypto error: {}", err),
            RecordError::Decode(err) => write!(f, "Record decode error: {}", err),
        }
    }
}

impl std::error::Error for RecordError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RecordError::Crypto(err) => Some(err),
            RecordError::Decode(err) => Some(err),
        }
    }
}

impl From<CryptoError> for RecordError {
    fn from(err: CryptoError) -> Self {
        RecordError::Crypto(err)
    }
}

impl From<CodecError> for RecordError {
    fn from(err: CodecError) -> Self {
        RecordError::Decode(err)
    }
}

// === GateError ===

/// Errors related to quality gate management.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    /// No gate with the given ID exists.
    NotFound(String),
    /// The gate is built in and cannot be edited or removed.
    NotEditable(String),
    /// A gate with the given ID already exists.
    DuplicateId(String),
    /// The gate pattern is not a valid regular expression.
    InvalidPattern(String),
    /// Reading or writing the gate settings file failed.
    IoError(String),
}

impl fmt::Display for GateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateError::NotFound(id) => write!(f, "Quality gate not found: {}", id),
            GateError::NotEditable(id) => write!(f, "Quality gate is not editable: {}", id),
            GateError::DuplicateId(id) => write!(f, "Quality gate already exists: {}", id),
            GateError::InvalidPattern(msg) => write!(f, "Invalid quality gate pattern: {}", msg),
            GateError::IoError(msg) => write!(f, "Quality gate I/O error: {}", msg),
        }
    }
}

impl std::error::Error for GateError {}

// === StoreError ===

/// Errors related to the opaque blob store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No record with the given ID exists.
    NotFound(String),
    /// Database operation failed.
    DatabaseError(String),
    /// A stored value could not be read back (bad ID or truncated blob).
    Corrupt(String),
    /// The record could not be encrypted or decrypted.
    Record(RecordError),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound(id) => write!(f, "Record not found: {}", id),
            StoreError::DatabaseError(msg) => write!(f, "Store database error: {}", msg),
            StoreError::Corrupt(msg) => write!(f, "Corrupt stored record: {}", msg),
            StoreError::Record(err) => write!(f, "Store record error: {}", err),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::DatabaseError(err.to_string())
    }
}

impl From<RecordError> for StoreError {
    fn from(err: RecordError) -> Self {
        StoreError::Record(err)
    }
}

impl From<CryptoError> for StoreError {
    fn from(err: CryptoError) -> Self {
        StoreError::Record(RecordError::Crypto(err))
    }
}

// === AnalysisError ===

/// Errors that end a password analysis run.
///
/// Failures of single records never end a run; they are listed in the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// Another analysis run is still active.
    AlreadyRunning,
    /// The run was cancelled before it finished.
    Cancelled,
    /// The stored entries could not be listed.
    Store(String),
    /// The background task panicked or was aborted.
    TaskFailed(String),
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::AlreadyRunning => write!(f, "Password analysis is already running"),
            AnalysisError::Cancelled => write!(f, "Password analysis was cancelled"),
            AnalysisError::Store(msg) => write!(f, "Password analysis store error: {}", msg),
            AnalysisError::TaskFailed(msg) => write!(f, "Password analysis task failed: {}", msg),
        }
    }
}

impl std::error::Error for AnalysisError {}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    IoError(String),
    /// Failed to serialize or deserialize settings.
    SerializationError(String),
    /// The provided settings key is invalid.
    InvalidKey(String),
    /// The provided settings value is invalid.
    InvalidValue(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::IoError(msg) => write!(f, "Settings I/O error: {}", msg),
            SettingsError::SerializationError(msg) => {
                write!(f, "Settings serialization error: {}", msg)
            }
            SettingsError::InvalidKey(key) => write!(f, "Invalid settings key: {}", key),
            SettingsError::InvalidValue(msg) => {
                write!(f, "Invalid settings value: {}", msg)
            }
        }
    }
}

impl std::error::Error for SettingsError {}
